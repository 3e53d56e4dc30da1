use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::{format_hhmm, validate_week, AvailabilityRule, Booking, BookingRequest};
use crate::db::repositories::{AvailabilityRepository, BookingRepository, ServiceRepository};
use crate::error::{AppError, AppResult};
use crate::modules::scheduling::coordinator::parse_date;
use crate::modules::scheduling::error::SchedulingError;

pub async fn list_services(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let services = state.store.list_active().await?;
    Ok(Json(services))
}

pub async fn get_availability(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rules = state.store.get_rules().await?;
    Ok(Json(rules))
}

pub async fn replace_availability(
    State(state): State<AppState>,
    Json(rules): Json<Vec<AvailabilityRule>>,
) -> AppResult<impl IntoResponse> {
    validate_week(&rules).map_err(AppError::Validation)?;
    state.store.replace_all(rules).await?;
    let rules = state.store.get_rules().await?;
    Ok(Json(rules))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub date: String,
    pub service_id: Option<Uuid>,
}

pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<impl IntoResponse> {
    let date = parse_date(&query.date)?;
    let now = state.env.scheduling.business_now();
    let slots = state
        .coordinator
        .available_slots(date, query.service_id, now)
        .await?;
    let slots: Vec<String> = slots.into_iter().map(format_hhmm).collect();
    Ok(Json(slots))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailPayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

pub async fn request_verification_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let now = state.env.scheduling.business_now();
    state
        .verification
        .request_code(&payload.email, now)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;
    Ok(Json(json!({ "status": "sent" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodePayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(equal = 6, message = "The code has 6 digits"))]
    pub code: String,
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodePayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let now = state.env.scheduling.business_now();
    state
        .verification
        .verify_code(&payload.email, &payload.code, now)
        .map_err(SchedulingError::from)?;
    Ok(Json(json!({ "status": "verified" })))
}

/// Booking plus the payment hint the success screen shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub requires_payment: bool,
}

pub async fn submit_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> AppResult<impl IntoResponse> {
    let now = state.env.scheduling.business_now();
    let (booking, service) = state.coordinator.submit_booking(request, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking,
            requires_payment: service.is_paid,
        }),
    ))
}

pub async fn list_meetings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let bookings = state.store.list_bookings().await?;
    Ok(Json(json!({ "appointments": bookings })))
}

pub async fn confirm_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let booking = state.coordinator.confirm_booking(id).await?;
    Ok(Json(booking))
}

pub async fn cancel_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let booking = state.coordinator.cancel_booking(id).await?;
    Ok(Json(booking))
}
