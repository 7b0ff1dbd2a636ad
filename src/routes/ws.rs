// WebSocket push channel: current snapshot on connect, then one `metrics` event per fast sample.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, timeout};

use super::AppState;
use crate::broadcast::PushEvent;
use crate::models::Snapshot;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_metrics(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading the store so no push between the two is lost.
        let rx = state.broadcaster.subscribe();
        if let Err(e) = stream_metrics(socket, rx, &state).await {
            tracing::info!("Metrics stream error: {}", e);
        }
    })
}

async fn stream_metrics(
    socket: WebSocket,
    mut rx: broadcast::Receiver<Snapshot>,
    state: &AppState,
) -> anyhow::Result<()> {
    let _guard = state.broadcaster.register_observer();
    tracing::info!(
        observers = state.broadcaster.observer_count(),
        "Observer connected to metrics stream"
    );
    let (mut sender, mut incoming) = socket.split();

    if !send_metrics(&mut sender, &state.store.read()).await? {
        return Ok(());
    }

    let mut ping_interval = interval_at(Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !send_metrics(&mut sender, &snapshot).await? {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Metrics observer lagged, skipped {} snapshots", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = incoming.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    tracing::debug!("Observer disconnected from metrics stream");
    Ok(())
}

/// Sends one `metrics` event. Ok(false) means the observer is gone or too slow and should be dropped.
async fn send_metrics(
    sender: &mut SplitSink<WebSocket, Message>,
    snapshot: &Snapshot,
) -> anyhow::Result<bool> {
    let json = serde_json::to_string(&PushEvent::Metrics(snapshot))?;
    let r = timeout(WS_SEND_TIMEOUT, sender.send(Message::Text(json.into()))).await;
    Ok(matches!(r, Ok(Ok(()))))
}
