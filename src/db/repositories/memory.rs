use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::db::error::DatabaseError;
use crate::db::models::{
    default_week, normalize, AvailabilityRule, Booking, BookingStatus, NewBooking, Service,
};

use super::{AvailabilityRepository, BookingRepository, SchedulingStore, ServiceRepository};

/// In-process store used when no `DATABASE_URL` is configured, and by the
/// test suite. All state sits behind one mutex, which doubles as the
/// slot-exclusivity guard: check-and-insert happens under the lock.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    rules: Vec<AvailabilityRule>,
    services: Vec<Service>,
    bookings: Vec<Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_services(default_catalog())
    }

    pub fn with_services(services: Vec<Service>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rules: default_week(),
                services,
                bookings: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn get_rules(&self) -> Result<Vec<AvailabilityRule>, DatabaseError> {
        Ok(normalize(&self.lock().rules))
    }

    async fn replace_all(&self, rules: Vec<AvailabilityRule>) -> Result<(), DatabaseError> {
        self.lock().rules = normalize(&rules);
        Ok(())
    }
}

#[async_trait]
impl ServiceRepository for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Service>, DatabaseError> {
        Ok(self
            .lock()
            .services
            .iter()
            .filter(|service| service.is_active)
            .cloned()
            .collect())
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<Service>, DatabaseError> {
        Ok(self
            .lock()
            .services
            .iter()
            .find(|service| service.id == id)
            .cloned())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn list_bookings(&self) -> Result<Vec<Booking>, DatabaseError> {
        let mut bookings = self.lock().bookings.clone();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn blocking_on_date(&self, date: Date) -> Result<Vec<Booking>, DatabaseError> {
        Ok(self
            .lock()
            .bookings
            .iter()
            .filter(|booking| booking.scheduled_date == date && booking.status.is_blocking())
            .cloned()
            .collect())
    }

    async fn insert_if_slot_free(&self, new: NewBooking) -> Result<Booking, DatabaseError> {
        let mut inner = self.lock();
        let taken = inner.bookings.iter().any(|booking| {
            booking.scheduled_date == new.scheduled_date
                && booking.scheduled_time == new.scheduled_time
                && booking.status.is_blocking()
        });
        if taken {
            return Err(DatabaseError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let booking = Booking {
            id: Uuid::new_v4(),
            service_id: new.service_id,
            scheduled_date: new.scheduled_date,
            scheduled_time: new.scheduled_time,
            status: new.status,
            lead_name: new.lead_name,
            lead_email: new.lead_email,
            lead_phone: new.lead_phone,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, DatabaseError> {
        Ok(self
            .lock()
            .bookings
            .iter()
            .find(|booking| booking.id == id)
            .cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, DatabaseError> {
        let mut inner = self.lock();
        let booking = inner
            .bookings
            .iter_mut()
            .find(|booking| booking.id == id)
            .ok_or(DatabaseError::NotFound)?;
        booking.status = status;
        booking.updated_at = OffsetDateTime::now_utc();
        Ok(booking.clone())
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Mirrors the seed rows of the Postgres migration.
fn default_catalog() -> Vec<Service> {
    let now = OffsetDateTime::now_utc();
    let service = |name: &str, description: &str, duration: i32, price: i64, is_paid: bool| {
        Service {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: Some(description.to_owned()),
            duration_minutes: duration,
            price,
            is_paid,
            requires_approval: is_paid,
            is_active: true,
            created_at: now,
        }
    };
    vec![
        service(
            "Consultoria Estratégica Elite",
            "Análise de viabilidade e infraestrutura para sistemas críticos.",
            60,
            150_000,
            true,
        ),
        service(
            "Arquitectura de Software",
            "Desenho de micro-serviços e definição de stack tecnológica.",
            90,
            250_000,
            true,
        ),
        service(
            "Reunião de Diagnóstico",
            "Sessão inicial para levantamento de requisitos de projecto.",
            30,
            0,
            false,
        ),
    ]
}
