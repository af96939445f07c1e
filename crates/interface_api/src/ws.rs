//! WebSocket endpoint
//!
//! Clients connect to `/ws`, join their user room (and any claim rooms they
//! are viewing), and receive `new_notification` and `receive_chat` events.
//! Chat sent over the socket is relayed to the claim room only; the REST
//! chat endpoint is the path that also persists the inbox notification.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use core_kernel::UserId;
use infra_realtime::{ChatMessage, ClientCommand, RealtimeHub, ServerEvent};

use crate::AppState;

/// Events buffered per socket before the writer applies backpressure
const SOCKET_BUFFER: usize = 32;

/// Upgrades the connection and hands it to the socket loop
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(SOCKET_BUFFER);

    // Writer: serialize events from every joined room onto the socket
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(error) => {
                    warn!(%error, "Failed to serialize realtime event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut room_tasks: Vec<JoinHandle<()>> = Vec::new();
    // Set by the join command; chat sent before joining is dropped
    let mut identity: Option<UserId> = None;

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let command = match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => command,
            Err(error) => {
                debug!(%error, "Ignoring malformed client command");
                continue;
            }
        };

        match command {
            ClientCommand::Join { user_id } => {
                identity = Some(user_id);
                let room = RealtimeHub::user_room(user_id);
                room_tasks.push(subscribe(&state.hub, &room, tx.clone()).await);
            }
            ClientCommand::JoinClaim { claim_id } => {
                let room = RealtimeHub::claim_room(claim_id);
                room_tasks.push(subscribe(&state.hub, &room, tx.clone()).await);
            }
            ClientCommand::SendChat { claim_id, body } => {
                let Some(sender_id) = identity else {
                    debug!("Chat before join ignored");
                    continue;
                };
                let message = ChatMessage::new(claim_id, sender_id, body);
                state
                    .hub
                    .emit_to_claim(claim_id, ServerEvent::ReceiveChat { message })
                    .await;
            }
        }
    }

    writer.abort();
    for task in room_tasks {
        task.abort();
    }
}

/// Forwards a room's broadcast stream into this socket's writer queue
async fn subscribe(
    hub: &RealtimeHub,
    room: &str,
    tx: mpsc::Sender<ServerEvent>,
) -> JoinHandle<()> {
    let mut receiver = hub.join(room).await;
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                // A slow socket skips what it missed rather than dying
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Socket lagged behind its room");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
