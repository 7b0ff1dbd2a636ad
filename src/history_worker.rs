// Background history worker: record one condensed row per interval, purge rows past retention.
// Each pass runs in its own task so a slow or failing store never stalls the timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, instrument, warn};

use crate::history_repo::{HistoryRepo, now_ms};
use crate::models::HistoryRecord;
use crate::snapshot_store::SnapshotStore;

#[derive(Debug, Clone)]
pub struct HistoryWorkerConfig {
    pub record_interval_secs: u64,
    pub prune_interval_secs: u64,
}

/// Running totals reported by the periodic stats log.
#[derive(Debug, Default)]
pub struct HistoryStats {
    pub records_written: AtomicU64,
    pub rows_pruned: AtomicU64,
}

/// Spawns the recorder/janitor loop. Stops when `shutdown_rx` changes or its sender is dropped.
pub fn spawn(
    store: Arc<SnapshotStore>,
    repo: Arc<HistoryRepo>,
    stats: Arc<HistoryStats>,
    config: HistoryWorkerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let record_every = Duration::from_secs(config.record_interval_secs);
        // First row one full interval after startup; the janitor runs immediately.
        let mut record_tick = interval_at(Instant::now() + record_every, record_every);
        record_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut prune_tick = interval(Duration::from_secs(config.prune_interval_secs));
        prune_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = record_tick.tick() => {
                    let (store, repo, stats) = (store.clone(), repo.clone(), stats.clone());
                    tokio::spawn(async move {
                        match record_tick_once(&store, &repo).await {
                            Ok(_) => {
                                stats.records_written.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(error = %e, operation = "record_history", "Failed to record history row");
                            }
                        }
                    });
                }
                _ = prune_tick.tick() => {
                    let (repo, stats) = (repo.clone(), stats.clone());
                    tokio::spawn(async move {
                        match prune_tick_once(&repo).await {
                            Ok(n) => {
                                stats.rows_pruned.fetch_add(n, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(error = %e, operation = "prune_old_data", "Failed to prune old data");
                            }
                        }
                    });
                }
                _ = shutdown_rx.changed() => {
                    debug!("History worker shutting down");
                    break;
                }
            }
        }
    })
}

/// Condenses the current snapshot into one row stamped with the wall clock and stores it.
/// A never-populated snapshot still yields a zero-valued row.
pub async fn record_tick_once(
    store: &SnapshotStore,
    repo: &HistoryRepo,
) -> anyhow::Result<HistoryRecord> {
    record_snapshot_at(store, repo, now_ms()?).await
}

#[instrument(skip(store, repo), fields(operation = "record_history"))]
pub async fn record_snapshot_at(
    store: &SnapshotStore,
    repo: &HistoryRepo,
    timestamp: i64,
) -> anyhow::Result<HistoryRecord> {
    let record = HistoryRecord::from_snapshot(&store.read(), timestamp);
    repo.insert(&record).await?;
    debug!(cpu = record.cpu_load_percent, "History row recorded");
    Ok(record)
}

/// Deletes rows older than the retention horizon, measured from the clock at execution time.
pub async fn prune_tick_once(repo: &HistoryRepo) -> anyhow::Result<u64> {
    let removed = repo.prune_old_data(now_ms()?).await?;
    if removed > 0 {
        tracing::info!(rows_removed = removed, "Pruned history rows past retention");
    }
    Ok(removed)
}
