//! Realtime chat nudges over WebSocket.
//!
//! Sockets authenticate with the session token when they open. Messages are
//! stored through the same path as the REST endpoint; the socket only tells
//! the other participant that a conversation changed and the client re-reads
//! it over REST. The registry lives in process memory.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth;
use crate::conversation::{post_message, SendMessageRequest};
use crate::error::ApiError;
use crate::models::{MessageType, User};

pub type ConnectionId = u64;

/// Frames pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    NewMessage { conversation_id: i32 },
    Error { message: String },
}

/// Frames accepted from clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    #[serde(rename_all = "camelCase")]
    SendMessage {
        conversation_id: i32,
        content: String,
        #[serde(default)]
        message_type: Option<MessageType>,
    },
    /// Identity claims sent after connecting are not trusted.
    Auth,
    Ping,
}

/// One registered socket. Dropping the receiver makes later sends to it fail,
/// after which the registry forgets it.
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: Uuid,
    pub events: mpsc::UnboundedReceiver<ServerEvent>,
}

#[derive(Default)]
struct Registry {
    sockets: RwLock<HashMap<Uuid, HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>>,
    next_id: AtomicU64,
}

/// Maps each user to the sockets they currently hold open.
#[derive(Clone, Default)]
pub struct Relay {
    registry: Arc<Registry>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: Uuid) -> Connection {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, events) = mpsc::unbounded_channel();
        self.registry
            .sockets
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(id, sender);
        Connection { id, user_id, events }
    }

    pub async fn unregister(&self, user_id: Uuid, id: ConnectionId) {
        let mut sockets = self.registry.sockets.write().await;
        if let Some(connections) = sockets.get_mut(&user_id) {
            connections.remove(&id);
            if connections.is_empty() {
                sockets.remove(&user_id);
            }
        }
    }

    /// Pushes `event` to every socket `user_id` holds. Returns how many
    /// sockets accepted it; an offline user simply misses the nudge.
    pub async fn notify(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let mut sockets = self.registry.sockets.write().await;
        let Some(connections) = sockets.get_mut(&user_id) else {
            return 0;
        };
        connections.retain(|_, sender| sender.send(event.clone()).is_ok());
        let delivered = connections.len();
        if connections.is_empty() {
            sockets.remove(&user_id);
        }
        delivered
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.registry
            .sockets
            .read()
            .await
            .get(&user_id)
            .map_or(0, HashMap::len)
    }
}

#[derive(Debug, Deserialize)]
pub struct SocketParams {
    token: Option<String>,
}

/// `GET /ws?token=..`. The token is checked before the upgrade so a
/// missing or forged token is answered with 401.
pub async fn socket_handler(
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, ApiError> {
    let token = params
        .token
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
    let user = auth::authenticate(&state, &token).await?;
    let ws = ws.ok_or_else(|| ApiError::BadRequest("Expected a WebSocket upgrade".to_string()))?;
    Ok(ws.on_upgrade(move |socket| serve_socket(socket, state, user)))
}

async fn serve_socket(socket: WebSocket, state: AppState, user: User) {
    let mut connection = state.relay.register(user.id).await;
    log::info!("Socket {} opened for user {}", connection.id, user.id);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = connection.events.recv() => {
                let Some(event) = event else { break };
                if send_event(&mut sink, &event).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(reply) = handle_frame(&state, &user, &text).await {
                        if send_event(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::debug!("Socket {} read failed: {}", connection.id, e);
                    break;
                }
            },
        }
    }

    state.relay.unregister(user.id, connection.id).await;
    log::info!("Socket {} closed for user {}", connection.id, user.id);
}

async fn send_event<S>(sink: &mut S, event: &ServerEvent) -> Result<(), axum::Error>
where
    S: futures::Sink<WsMessage, Error = axum::Error> + Unpin,
{
    match serde_json::to_string(event) {
        Ok(text) => sink.send(WsMessage::Text(text)).await,
        Err(e) => {
            log::error!("Failed to encode socket event: {}", e);
            Ok(())
        }
    }
}

/// Processes one text frame from `user`. Returns the frame to send back to
/// that socket, if any.
pub async fn handle_frame(state: &AppState, user: &User, text: &str) -> Option<ServerEvent> {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            return Some(ServerEvent::Error {
                message: format!("Malformed frame: {}", e),
            })
        }
    };
    match frame {
        ClientFrame::SendMessage {
            conversation_id,
            content,
            message_type,
        } => {
            let request = SendMessageRequest {
                content,
                message_type,
            };
            match post_message(state, user, conversation_id, request).await {
                Ok(_) => None,
                Err(e) => Some(ServerEvent::Error {
                    message: e.public_message(),
                }),
            }
        }
        ClientFrame::Auth => Some(ServerEvent::Error {
            message: "Socket identity comes from the session token".to_string(),
        }),
        ClientFrame::Ping => None,
    }
}
