//! WebSocket connection loop.
//!
//! Each connection owns one notification channel. After the client
//! registers a user id, the channel is entered into the session
//! registry and pushed notifications are forwarded to the socket as
//! `event` messages. Disconnect and the `unregister` command both
//! remove the channel; the registry treats repeats as no-ops.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::domain::{ChannelHandle, SessionRegistry, UserId};

/// Runs the read/write loop for a single WebSocket connection.
pub async fn run_connection(socket: WebSocket, sessions: Arc<SessionRegistry>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut notification_rx) = ChannelHandle::new();
    let channel_id = handle.id;

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &sessions, &handle).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Notification pushed for the registered user
            notification = notification_rx.recv() => {
                let Some(event) = notification else {
                    break;
                };
                let msg = WsMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    msg_type: WsMessageType::Event,
                    timestamp: chrono::Utc::now(),
                    payload: serde_json::to_value(&event).unwrap_or_default(),
                };
                let json = serde_json::to_string(&msg).unwrap_or_default();
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    sessions.unregister(channel_id).await;
    tracing::debug!(channel = %channel_id, "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    sessions: &SessionRegistry,
    handle: &ChannelHandle,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = WsMessage {
            id: String::new(),
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 400,
                "message": "malformed JSON"
            }),
        };
        return serde_json::to_string(&err).ok();
    };

    match serde_json::from_value::<WsCommand>(msg.payload.clone()) {
        Ok(WsCommand::Register { user_id }) => {
            let Ok(user) = user_id.parse::<uuid::Uuid>().map(UserId::from_uuid) else {
                let err = WsMessage {
                    id: msg.id,
                    msg_type: WsMessageType::Error,
                    timestamp: chrono::Utc::now(),
                    payload: serde_json::json!({
                        "code": 400,
                        "message": "malformed user id"
                    }),
                };
                return serde_json::to_string(&err).ok();
            };
            sessions.register(user, handle.clone()).await;
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "registered": user.to_string(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        Ok(WsCommand::Unregister) => {
            sessions.unregister(handle.id).await;
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "unregistered": true,
                }),
            };
            serde_json::to_string(&response).ok()
        }
        Err(_) => {
            let err = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Error,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "code": 404,
                    "message": "unknown command"
                }),
            };
            serde_json::to_string(&err).ok()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn command_json(payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": "req-1",
            "type": "command",
            "timestamp": chrono::Utc::now(),
            "payload": payload,
        })
        .to_string()
    }

    fn parse(response: Option<String>) -> serde_json::Value {
        let Some(response) = response else {
            panic!("expected a response");
        };
        serde_json::from_str(&response).unwrap_or(serde_json::Value::Null)
    }

    #[tokio::test]
    async fn register_command_enters_the_registry() {
        let sessions = SessionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();
        let user = UserId::new();

        let text = command_json(serde_json::json!({
            "command": "register",
            "user_id": user.to_string(),
        }));
        let response = parse(handle_text_message(&text, &sessions, &handle).await);

        assert_eq!(response["type"], "response");
        assert_eq!(response["payload"]["registered"], user.to_string());
        assert_eq!(sessions.senders_for(user).await.len(), 1);
    }

    #[tokio::test]
    async fn unregister_command_removes_the_channel() {
        let sessions = SessionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();
        let user = UserId::new();
        sessions.register(user, handle.clone()).await;

        let text = command_json(serde_json::json!({"command": "unregister"}));
        let response = parse(handle_text_message(&text, &sessions, &handle).await);

        assert_eq!(response["type"], "response");
        assert!(sessions.senders_for(user).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_yields_error_reply() {
        let sessions = SessionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();

        let response = parse(handle_text_message("not json", &sessions, &handle).await);
        assert_eq!(response["type"], "error");
        assert_eq!(response["payload"]["code"], 400);
    }

    #[tokio::test]
    async fn malformed_user_id_yields_error_reply() {
        let sessions = SessionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();

        let text = command_json(serde_json::json!({
            "command": "register",
            "user_id": "not-a-uuid",
        }));
        let response = parse(handle_text_message(&text, &sessions, &handle).await);
        assert_eq!(response["type"], "error");
        assert_eq!(sessions.channel_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_command_yields_error_reply() {
        let sessions = SessionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();

        let text = command_json(serde_json::json!({"command": "subscribe"}));
        let response = parse(handle_text_message(&text, &sessions, &handle).await);
        assert_eq!(response["type"], "error");
        assert_eq!(response["payload"]["code"], 404);
    }
}
