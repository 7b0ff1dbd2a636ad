// Sampler scheduler: independent timers, one per facet group.
// Every tick spawns its sample as a separate task, at most one in flight per facet group;
// a tick that finds its group still running is skipped. A hung provider call therefore
// holds one task (and at most one blocking thread) and only stalls its own facet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::broadcast::Broadcaster;
use crate::history_worker::HistoryStats;
use crate::snapshot_store::{Facet, SnapshotStore};
use crate::telemetry::TelemetryProvider;

/// Provider, shared state and shutdown for the samplers.
pub struct WorkerDeps<P> {
    pub provider: Arc<P>,
    pub store: Arc<SnapshotStore>,
    pub broadcaster: Broadcaster,
    pub history_stats: Arc<HistoryStats>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Sampler cadences and logging config.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub fast_interval_ms: u64,
    pub network_interval_ms: u64,
    /// Disk usage changes slowly; the first run still happens at startup.
    pub disk_interval_secs: u64,
    /// How often to log app stats (observers, rows recorded/pruned).
    pub stats_log_interval_secs: u64,
}

/// Single-run slot for one facet group. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    /// Claims the slot, or `None` while a previous run still holds it.
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the slot on drop, including when the run panics or is cancelled.
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Spawns `run` if `slot` is free; otherwise logs and skips this tick.
fn spawn_exclusive<F>(slot: &InFlight, facet: &'static str, run: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    match slot.try_begin() {
        Some(guard) => {
            tokio::spawn(async move {
                let _guard = guard;
                run.await;
            });
            true
        }
        None => {
            debug!(facet, "previous run still in flight; skipping tick");
            false
        }
    }
}

pub fn spawn<P: TelemetryProvider>(
    deps: WorkerDeps<P>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        provider,
        store,
        broadcaster,
        history_stats,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut fast_tick = interval(Duration::from_millis(config.fast_interval_ms));
        fast_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut network_tick = interval(Duration::from_millis(config.network_interval_ms));
        network_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut disk_tick = interval(Duration::from_secs(config.disk_interval_secs));
        disk_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(config.stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let fast_slot = InFlight::default();
        let network_slot = InFlight::default();
        let disk_slot = InFlight::default();
        // Static CPU identity: fetched once, retried from the fast tick until it succeeds.
        let identity_slot = InFlight::default();
        let identity_cached = Arc::new(AtomicBool::new(false));

        loop {
            tokio::select! {
                _ = fast_tick.tick() => {
                    if !identity_cached.load(Ordering::Acquire) {
                        let (p, s, cached) = (provider.clone(), store.clone(), identity_cached.clone());
                        spawn_exclusive(&identity_slot, "cpu_identity", async move {
                            if run_identity_fetch(p.as_ref(), &s).await {
                                cached.store(true, Ordering::Release);
                            }
                        });
                    }
                    let (p, s, b) = (provider.clone(), store.clone(), broadcaster.clone());
                    spawn_exclusive(&fast_slot, "fast", async move {
                        run_fast_sample(p.as_ref(), &s, &b).await;
                    });
                }
                _ = network_tick.tick() => {
                    let (p, s) = (provider.clone(), store.clone());
                    spawn_exclusive(&network_slot, "network", async move {
                        run_network_sample(p.as_ref(), &s).await;
                    });
                }
                _ = disk_tick.tick() => {
                    let (p, s) = (provider.clone(), store.clone());
                    spawn_exclusive(&disk_slot, "disk", async move {
                        run_disk_sample(p.as_ref(), &s).await;
                    });
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        observers = broadcaster.observer_count(),
                        records_written_total = history_stats.records_written.load(Ordering::Relaxed),
                        rows_pruned_total = history_stats.rows_pruned.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
                _ = shutdown_rx.changed() => {
                    debug!("Sampler shutting down");
                    break;
                }
            }
        }
    })
}

/// Refreshes cpu load, memory and uptime, then pushes the whole snapshot to observers.
/// Returns false (and pushes nothing) only when every one of the three queries failed.
pub async fn run_fast_sample<P: TelemetryProvider>(
    provider: &P,
    store: &SnapshotStore,
    broadcaster: &Broadcaster,
) -> bool {
    let (load, memory, uptime) =
        tokio::join!(provider.cpu_load(), provider.memory(), provider.uptime());

    let facets: Vec<Facet> = [
        facet(load, "cpu_load").map(Facet::CpuLoad),
        facet(memory, "memory").map(Facet::Memory),
        facet(uptime, "uptime").map(Facet::Uptime),
    ]
    .into_iter()
    .flatten()
    .collect();

    if facets.is_empty() {
        return false;
    }
    // Publish under the write lock so observers see snapshots in update order.
    store.update_all_then(facets, |snapshot| broadcaster.publish(snapshot.clone()));
    true
}

pub async fn run_network_sample<P: TelemetryProvider>(provider: &P, store: &SnapshotStore) -> bool {
    match facet(provider.network().await, "network") {
        Some(interfaces) => {
            store.update(Facet::Network(interfaces));
            true
        }
        None => false,
    }
}

pub async fn run_disk_sample<P: TelemetryProvider>(provider: &P, store: &SnapshotStore) -> bool {
    match facet(provider.disks().await, "disks") {
        Some(disks) => {
            store.update(Facet::Disk(disks));
            true
        }
        None => false,
    }
}

pub async fn run_identity_fetch<P: TelemetryProvider>(provider: &P, store: &SnapshotStore) -> bool {
    match facet(provider.cpu_identity().await, "cpu_identity") {
        Some(id) => {
            debug!(brand = %id.brand, cores = id.core_count, "CPU identity cached");
            store.update(Facet::CpuIdentity(id));
            true
        }
        None => false,
    }
}

/// Logs a failed provider query; the facet keeps its last good value.
fn facet<T>(result: anyhow::Result<T>, operation: &'static str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, operation, "telemetry query failed; keeping last value");
            None
        }
    }
}
