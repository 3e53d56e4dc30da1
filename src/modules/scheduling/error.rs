use thiserror::Error;

use crate::db::DatabaseError;

use super::verification::VerificationError;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Booking status does not allow this transition")]
    InvalidTransition,

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
