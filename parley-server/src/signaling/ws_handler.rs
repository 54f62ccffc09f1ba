use crate::Relay;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ConnectionId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(relay): State<Relay>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Relay) {
    let connection = ConnectionId::new();
    info!("New WebSocket connection: {}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<SignalMessage>();

    relay.register(connection, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match SignalMessage::from_json(text.as_str()) {
                        Ok(signal) => relay.handle_message(connection, signal),
                        Err(e) => warn!("Invalid SignalMessage from {}: {}", connection, e),
                    },
                    Message::Binary(_) => {
                        debug!("Ignoring binary frame from {}", connection);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.leave(connection);
    info!("WebSocket disconnected: {}", connection);
}
