//! WebSocket listeners of the push channel.

use axum::{
    Extension,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::push::{PushChannel, PushEvent};

/// Subscribe to deploy-status pushes.
///
/// Every broadcast arrives as a text frame `{"event": ..., "data": ...}`.
#[utoipa::path(
    get,
    path = "/jobs/eng/giudico/deploy-status/socket",
    tag = "deploy-status",
    responses(
        (status = 101, description = "Switching to the WebSocket protocol")
    )
)]
pub async fn deploy_status_socket(
    ws: WebSocketUpgrade,
    Extension(channel): Extension<PushChannel>,
) -> Response {
    let rx = channel.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, rx, channel))
}

async fn forward_events(
    mut socket: WebSocket,
    mut rx: Receiver<PushEvent>,
    channel: PushChannel,
) {
    tracing::info!(listeners = channel.listener_count(), "Push listener connected");
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("Failed to encode push event: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Push listener fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    drop(rx);
    tracing::info!(listeners = channel.listener_count(), "Push listener disconnected");
}
