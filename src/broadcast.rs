// Fan-out of full snapshots to connected observers. Best-effort, no replay.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use crate::models::Snapshot;

/// Rate limit for the "no receivers" log (avoid logging every second when nobody is connected).
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Event envelope sent to observers: `{"event":"metrics","data":{...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum PushEvent<'a> {
    Metrics(&'a Snapshot),
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Snapshot>,
    observers: Arc<AtomicUsize>,
    last_no_receivers_log: Arc<Mutex<Option<Instant>>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            observers: Arc::new(AtomicUsize::new(0)),
            last_no_receivers_log: Arc::new(Mutex::new(None)),
        }
    }

    /// Pushes the snapshot to every current subscriber. Returns how many received it.
    pub fn publish(&self, snapshot: Snapshot) -> usize {
        match self.tx.send(snapshot) {
            Ok(n) => n,
            Err(_) => {
                if let Ok(mut last) = self.last_no_receivers_log.lock()
                    && last.is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL)
                {
                    tracing::debug!(
                        operation = "broadcast_snapshot",
                        "No connected observers; snapshot not delivered"
                    );
                    *last = Some(Instant::now());
                }
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Registers a connected observer; the count drops when the guard is dropped.
    pub fn register_observer(&self) -> ObserverGuard {
        self.observers.fetch_add(1, Ordering::Relaxed);
        ObserverGuard(self.observers.clone())
    }

    pub fn observer_count(&self) -> usize {
        self.observers.load(Ordering::Relaxed)
    }
}

/// Decrements the observer count on drop (connect = +1, drop = -1).
pub struct ObserverGuard(Arc<AtomicUsize>);

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
