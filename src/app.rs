use axum::{middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    app_state::AppState, db::repositories::SchedulingStore,
    middleware::tracing::request_tracing_middleware,
    modules::scheduling::routes::scheduling_routes, websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let ws_app = websocket_routes().with_state(state.events.sender());

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .merge(ws_app)
        .nest("/scheduling", scheduling_routes())
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn hello() -> &'static str {
    "Scheduling backend says hello!\n"
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let store_status = match state.store.ping().await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::info!("Store health check failed: {}", e);
            "unhealthy"
        }
    };

    let timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "store": store_status
        }
    }))
}
