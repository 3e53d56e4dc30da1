use axum::{routing::get, Router};
use tokio::sync::broadcast::Sender;

use super::ws_handler::ws_handler;

pub fn websocket_routes() -> Router<Sender<String>> {
    Router::new().route("/ws", get(ws_handler))
}
