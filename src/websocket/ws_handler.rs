use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::debug;

/// Upgrades a dashboard client and streams domain events at it.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(events): State<broadcast::Sender<String>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(socket: WebSocket, events: broadcast::Sender<String>) {
    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    let mut rx = events.subscribe();

    // Incoming frames are drained only to notice the client going away;
    // the feed is one-way.
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Task forwarding domain events to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if sender.send(Message::Text(event.into())).await.is_err() {
                break;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = recv_task => {},
        _ = send_task => {},
    }

    debug!("websocket client disconnected");
}
