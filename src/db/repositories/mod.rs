mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use super::error::DatabaseError;
use super::models::{AvailabilityRule, Booking, BookingStatus, NewBooking, Service};

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// The full week, exactly one rule per day, gaps filled with defaults.
    async fn get_rules(&self) -> Result<Vec<AvailabilityRule>, DatabaseError>;

    /// Replaces the whole template. Callers validate the set first.
    async fn replace_all(&self, rules: Vec<AvailabilityRule>) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Service>, DatabaseError>;

    async fn get_service(&self, id: Uuid) -> Result<Option<Service>, DatabaseError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError>;

    /// Pending and confirmed bookings on the date; only these block slots.
    async fn blocking_on_date(&self, date: Date) -> Result<Vec<Booking>, DatabaseError>;

    /// Inserts only if no pending/confirmed booking already holds the
    /// `(date, time)` slot; fails with [`DatabaseError::Duplicate`]
    /// otherwise. This is the storage half of the no-double-booking
    /// invariant, so it must stay atomic with respect to concurrent calls.
    async fn insert_if_slot_free(&self, new: NewBooking) -> Result<Booking, DatabaseError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, DatabaseError>;

    async fn set_status(&self, id: Uuid, status: BookingStatus)
        -> Result<Booking, DatabaseError>;
}

/// Everything the scheduling module needs from storage.
#[async_trait]
pub trait SchedulingStore:
    AvailabilityRepository + ServiceRepository + BookingRepository
{
    async fn ping(&self) -> Result<(), DatabaseError>;
}
