use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{
    normalize, AvailabilityRule, Booking, BookingStatus, NewBooking, Service,
};

use super::{AvailabilityRepository, BookingRepository, SchedulingStore, ServiceRepository};

const BOOKING_COLUMNS: &str = "id, service_id, scheduled_date, scheduled_time, status, \
     lead_name, lead_email, lead_phone, notes, created_at, updated_at";

/// Postgres-backed store. Slot exclusivity is enforced by the partial
/// unique index on `bookings (scheduled_date, scheduled_time)` over live
/// statuses, so the conditional insert is a plain INSERT that surfaces
/// the unique violation as [`DatabaseError::Duplicate`].
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PgStore {
    async fn get_rules(&self) -> Result<Vec<AvailabilityRule>, DatabaseError> {
        let rows = sqlx::query_as::<_, AvailabilityRule>(
            "SELECT day_of_week, start_time, end_time, is_active \
             FROM availability_rules ORDER BY day_of_week",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(normalize(&rows))
    }

    async fn replace_all(&self, rules: Vec<AvailabilityRule>) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM availability_rules")
            .execute(&mut *tx)
            .await?;
        for rule in &rules {
            sqlx::query(
                "INSERT INTO availability_rules (day_of_week, start_time, end_time, is_active) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(rule.day_of_week)
            .bind(rule.start_time)
            .bind(rule.end_time)
            .bind(rule.is_active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ServiceRepository for PgStore {
    async fn list_active(&self) -> Result<Vec<Service>, DatabaseError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, name, description, duration_minutes, price, is_paid, \
             requires_approval, is_active, created_at \
             FROM services WHERE is_active ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<Service>, DatabaseError> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, description, duration_minutes, price, is_paid, \
             requires_approval, is_active, created_at \
             FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service)
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn blocking_on_date(&self, date: Date) -> Result<Vec<Booking>, DatabaseError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE scheduled_date = $1 AND status IN ('pending', 'confirmed') \
             ORDER BY scheduled_time"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn insert_if_slot_free(&self, new: NewBooking) -> Result<Booking, DatabaseError> {
        let result = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings (id, service_id, scheduled_date, scheduled_time, status, \
             lead_name, lead_email, lead_phone, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.service_id)
        .bind(new.scheduled_date)
        .bind(new.scheduled_time)
        .bind(new.status)
        .bind(new.lead_name)
        .bind(new.lead_email)
        .bind(new.lead_phone)
        .bind(new.notes)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|err| {
            if err
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                DatabaseError::Duplicate
            } else {
                err.into()
            }
        })
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        booking.ok_or(DatabaseError::NotFound)
    }
}

#[async_trait]
impl SchedulingStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
