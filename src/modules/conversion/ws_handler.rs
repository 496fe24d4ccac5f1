use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;

use crate::state::AppState;

/// Live progress channel. Server-to-client only; a client that connects
/// mid-job sees only events published after it registered.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (generation, mut rx) = state.notifier.register();
    info!("WebSocket connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(_) => continue,
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    // Sender replaced by a newer connection; this stream is done.
                    None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    // Clients send nothing meaningful on this channel.
                    _ => {}
                }
            }
        }
    }

    state.notifier.unregister(generation);
    info!("WebSocket disconnected");
}
