//! WebSocket transport for lobby connections

use crate::game::session::GameSession;
use crate::lobby::controller::LobbyController;
use crate::transport::connection::ConnectionHandler;
use crate::transport::protocol::encode_server_event;
use crate::transport::publisher::{ChannelEventSink, ClientHandle};
use crate::utils::generate_connection_id;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long the writer gets to flush queued events after the reader stops
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Drive one upgraded socket until the client goes away
pub async fn serve_socket<S: GameSession + 'static>(
    socket: WebSocket,
    lobby: Arc<LobbyController<S>>,
) {
    let connection_id = generate_connection_id();
    let (sink, mut outbound) = ChannelEventSink::new();
    let client = ClientHandle::new(connection_id, Arc::new(sink));

    let mut handler = match ConnectionHandler::open(lobby, client) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Failed to register connection {}: {}", connection_id, e);
            return;
        }
    };
    info!("Client connected: {}", connection_id);

    let (mut writer, mut reader) = socket.split();

    let write_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match encode_server_event(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode '{}' event: {}", event.name(), e);
                    continue;
                }
            };

            if writer.send(Message::Text(text.into())).await.is_err() {
                debug!("Socket writer for {} closed", connection_id);
                break;
            }
        }
        let _ = writer.close().await;
    });
    let writer_abort = write_task.abort_handle();

    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Err(e) = handler.handle_text(text.as_str()) {
                    error!("Error handling event from {}: {}", connection_id, e);
                }
                if handler.is_closed() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                debug!("Ignoring binary frame from {}", connection_id);
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Socket error on {}: {}", connection_id, e);
                break;
            }
        }
    }

    match handler.close() {
        Ok(detached) => info!(
            "Client disconnected: {} ({} binding(s) detached)",
            connection_id, detached
        ),
        Err(e) => warn!("Failed to close connection {}: {}", connection_id, e),
    }
    drop(handler);

    if tokio::time::timeout(WRITER_FLUSH_TIMEOUT, write_task)
        .await
        .is_err()
    {
        writer_abort.abort();
    }
}
