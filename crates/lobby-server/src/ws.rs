//! `WebSocket` endpoint backing the notification channel.
//!
//! Clients connect to `GET /ws/{accountId}` and receive every party event
//! and gift message addressed to that account as a JSON text frame. A
//! second socket for the same account replaces the first, and a socket
//! that falls too far behind is closed.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use lobby_types::AccountId;

use crate::state::AppState;

/// Upgrade to a `WebSocket` and attach it to the account's queue.
///
/// # Route
///
/// `GET /ws/{accountId}`
pub async fn ws_connect(
    ws: WebSocketUpgrade,
    Path(account_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let account_id = AccountId::from(account_id);
    ws.on_upgrade(move |socket| handle_ws(socket, account_id, state))
}

/// Forward queued messages until either side closes.
async fn handle_ws(socket: WebSocket, account_id: AccountId, state: Arc<AppState>) {
    let (connection, mut rx) = state.hub.register(account_id.clone());
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            queued = rx.recv() => {
                let Some(message) = queued else {
                    debug!(account_id = %account_id, "Queue closed by the hub");
                    break;
                };
                let frame = Message::Text(message.to_string().into());
                if sender.send(frame).await.is_err() {
                    debug!(account_id = %account_id, "WebSocket send failed");
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // Client frames carry nothing the server acts on.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.unregister(&account_id, connection);
}
