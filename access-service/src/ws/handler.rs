//! Websocket endpoints for device and dashboard channels.
//!
//! Each connection registers a handle with the connection registry and
//! forwards queued outbound frames to the socket from a dedicated task, so
//! a slow or dead peer never blocks an HTTP handler. Inbound frames are
//! parsed against the closed message union; unknown frames are logged and
//! dropped.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::services::messages::{InboundMessage, OutboundMessage};
use crate::services::registry::{ChannelHandle, DeviceId, OutboundFrame};
use crate::AppState;

/// `GET /ws/device/:device_id` - persistent channel for one physical device.
pub async fn device_channel(
    ws: WebSocketUpgrade,
    Path(device_id): Path<DeviceId>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Some(device_id)))
}

/// `GET /ws/client` - anonymous dashboard channel receiving broadcasts.
pub async fn client_channel(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, None))
}

async fn handle_socket(socket: WebSocket, state: AppState, device_id: Option<DeviceId>) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut rx) = ChannelHandle::new();

    state.registry.connect(handle.clone(), device_id);
    info!(?device_id, channel = handle.id(), "Channel connected");

    // Outbound frames are queued by the registry and drained here, so
    // registry callers never await the socket.
    let mut forward = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Message(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sink.close().await;
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&state, &handle, &text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(?device_id, error = %e, "Channel read error");
                        break;
                    }
                }
            }
            _ = &mut forward => break,
        }
    }

    state.registry.disconnect(&handle, device_id);
    forward.abort();
    info!(?device_id, channel = handle.id(), "Channel disconnected");
}

fn handle_inbound(state: &AppState, handle: &ChannelHandle, text: &str) {
    let message = match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Unknown or malformed device message");
            return;
        }
    };

    match message {
        InboundMessage::Auth { token } => {
            let success = token.is_some();
            let message = if success {
                "Authenticated".to_string()
            } else {
                "Missing token".to_string()
            };
            state
                .registry
                .send_to_handle(handle, &OutboundMessage::AuthResponse { success, message });
        }
        InboundMessage::NfcCardRegistered {
            card_uid,
            user_id,
            card_name,
        } => {
            info!(user_id, card_uid = %card_uid, ?card_name, "Device reported card enrollment");
            state.registry.send_to_handle(
                handle,
                &OutboundMessage::NfcRegistrationSuccess {
                    success: true,
                    message: "Card received".to_string(),
                },
            );
        }
        InboundMessage::AccessLog {
            id_user,
            user_name,
            action,
            access_type,
        } => {
            info!(?id_user, ?user_name, ?action, ?access_type, "Device reported access event");
        }
        InboundMessage::ActionConfirmed { action_id } => {
            info!(action_id, "Device confirmed action over channel");
        }
    }
}
