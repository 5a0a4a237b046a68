// =============================================================================
// WebSocket Handler — Push-based dashboard updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate frame on connect (the latest analysis, or an idle frame
//      when nothing has been searched yet).
//   2. A fresh frame every 500 ms whenever the state_version has changed
//      since the last push (new search, overlay defaults changed).
//
// The handler also responds to Ping frames with Pong frames and stops on
// Close.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::analysis::DashboardView;
use crate::app_state::AppState;

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Outbound frame.
#[derive(Serialize)]
struct PushFrame {
    state_version: u64,
    seq: u64,
    /// `None` until the first analysis completes.
    analysis: Option<DashboardView>,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Runs the push loop and the receive loop concurrently via `tokio::select!`.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut sequence: u64 = 0;
    let mut last_sent_version = state.current_state_version();

    if let Err(e) = send_frame(&mut sender, &state, &mut sequence).await {
        warn!(error = %e, "Failed to send initial WebSocket frame");
        return;
    }

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                let current_version = state.current_state_version();
                if current_version != last_sent_version {
                    if let Err(e) = send_frame(&mut sender, &state, &mut sequence).await {
                        debug!(error = %e, "WebSocket send failed — disconnecting");
                        break;
                    }
                    last_sent_version = current_version;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(frames = sequence, "WebSocket connection closed");
}

async fn send_frame<S>(sender: &mut S, state: &Arc<AppState>, sequence: &mut u64) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    *sequence += 1;

    let overlays = state.runtime_config.read().default_overlays;
    let frame = PushFrame {
        state_version: state.current_state_version(),
        seq: *sequence,
        analysis: state.latest_snapshot().map(|s| s.view(overlays)),
    };

    match serde_json::to_string(&frame) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(version = frame.state_version, seq = frame.seq, "WebSocket frame sent");
            Ok(())
        }
        Err(e) => {
            // Serialisation errors are not network errors; keep the socket.
            warn!(error = %e, "Failed to serialize WebSocket frame");
            Ok(())
        }
    }
}
