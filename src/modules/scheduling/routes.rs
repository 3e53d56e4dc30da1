use axum::routing::{delete, get, post};
use axum::Router;

use crate::app_state::AppState;

use super::handlers;

pub fn scheduling_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(handlers::list_services))
        .route(
            "/availability",
            get(handlers::get_availability).put(handlers::replace_availability),
        )
        .route("/slots", get(handlers::list_slots))
        .route("/verify-email", post(handlers::request_verification_code))
        .route("/verify-code", post(handlers::verify_code))
        .route("/request", post(handlers::submit_booking))
        .route("/meetings", get(handlers::list_meetings))
        .route("/meetings/{id}/confirm", post(handlers::confirm_meeting))
        .route("/meetings/{id}", delete(handlers::cancel_meeting))
}
