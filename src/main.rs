use anyhow::Result;
use hostpulse::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Last-resort handler: a panicking sample or request task is logged and dropped,
/// the runtime and every other timer keep running.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "task panicked; continuing");
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();
    install_panic_hook();

    let app_config = config::AppConfig::load()?;

    let history_repo = Arc::new(
        history_repo::HistoryRepo::connect(
            &app_config.database.path,
            app_config.database.retention_days,
        )
        .await?,
    );
    history_repo.init().await?;

    let provider = Arc::new(telemetry::SysinfoProvider::new());
    let store = Arc::new(snapshot_store::SnapshotStore::new());
    let broadcaster = broadcast::Broadcaster::new(app_config.publishing.broadcast_capacity);
    let history_stats = Arc::new(history_worker::HistoryStats::default());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let sampler_handle = worker::spawn(
        worker::WorkerDeps {
            provider,
            store: store.clone(),
            broadcaster: broadcaster.clone(),
            history_stats: history_stats.clone(),
            shutdown_rx: shutdown_rx.clone(),
        },
        worker::WorkerConfig {
            fast_interval_ms: app_config.sampling.fast_interval_ms,
            network_interval_ms: app_config.sampling.network_interval_ms,
            disk_interval_secs: app_config.sampling.disk_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );
    let history_handle = history_worker::spawn(
        store.clone(),
        history_repo.clone(),
        history_stats,
        history_worker::HistoryWorkerConfig {
            record_interval_secs: app_config.history.record_interval_secs,
            prune_interval_secs: app_config.history.prune_interval_secs,
        },
        shutdown_rx,
    );

    let app = routes::app(store, broadcaster, history_repo.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            let _ = sampler_handle.await;
            let _ = history_handle.await;
            history_repo.close().await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
