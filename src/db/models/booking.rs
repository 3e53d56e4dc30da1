use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;
use validator::Validate;

use super::{hhmm, ymd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Pending and confirmed bookings hold their slot.
    pub fn is_blocking(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    #[serde(with = "ymd")]
    pub scheduled_date: Date,
    #[serde(with = "hhmm")]
    pub scheduled_time: Time,
    pub status: BookingStatus,
    pub lead_name: String,
    pub lead_email: String,
    pub lead_phone: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Storage-level insert payload, built by the coordinator once the slot
/// and verification checks have passed.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_id: Uuid,
    pub scheduled_date: Date,
    pub scheduled_time: Time,
    pub status: BookingStatus,
    pub lead_name: String,
    pub lead_email: String,
    pub lead_phone: String,
    pub notes: Option<String>,
}

/// Public booking submission. `date` arrives either as `YYYY-MM-DD` or as
/// a full ISO timestamp (the site serializes a JS Date); parsing happens
/// in the coordinator so both shapes are accepted. `code` is optional:
/// the two-step flow verifies it up front via `/scheduling/verify-code`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: Uuid,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
    pub code: Option<String>,
}
