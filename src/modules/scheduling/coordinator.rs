use std::sync::Arc;

use time::{Date, OffsetDateTime, Time};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db::models::{
    Booking, BookingRequest, BookingStatus, NewBooking, Service, HHMM, YMD,
};
use crate::db::repositories::{
    AvailabilityRepository, BookingRepository, SchedulingStore, ServiceRepository,
};
use crate::db::DatabaseError;
use crate::events::{DomainEvent, EventBus};

use super::error::SchedulingError;
use super::slots::compute_slots;
use super::verification::VerificationGate;

/// Orchestrates the booking protocol: verify, re-check the slot, commit,
/// publish. The freedom re-check closes the window between the client's
/// slot listing and its submission; the storage-level conditional insert
/// closes the remaining race between two concurrent submissions.
pub struct BookingCoordinator {
    store: Arc<dyn SchedulingStore>,
    gate: Arc<VerificationGate>,
    events: EventBus,
    default_slot_minutes: i64,
}

impl BookingCoordinator {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        gate: Arc<VerificationGate>,
        events: EventBus,
        default_slot_minutes: i64,
    ) -> Self {
        Self {
            store,
            gate,
            events,
            default_slot_minutes,
        }
    }

    /// Free slots for a date. Spacing comes from the service when one is
    /// given, otherwise from the configured default.
    pub async fn available_slots(
        &self,
        date: Date,
        service_id: Option<Uuid>,
        now: OffsetDateTime,
    ) -> Result<Vec<Time>, SchedulingError> {
        let duration_minutes = match service_id {
            Some(id) => i64::from(self.active_service(id).await?.duration_minutes),
            None => self.default_slot_minutes,
        };
        let rules = self.store.get_rules().await?;
        let bookings = self.store.blocking_on_date(date).await?;
        Ok(compute_slots(
            date,
            duration_minutes,
            &rules,
            &bookings,
            now,
        ))
    }

    pub async fn submit_booking(
        &self,
        request: BookingRequest,
        now: OffsetDateTime,
    ) -> Result<(Booking, Service), SchedulingError> {
        request
            .validate()
            .map_err(|err| SchedulingError::Validation(err.to_string()))?;
        let date = parse_date(&request.date)?;
        let time = parse_time(&request.time)?;

        self.gate.redeem(&request.email, request.code.as_deref(), now)?;

        let service = self.active_service(request.service_id).await?;

        let rules = self.store.get_rules().await?;
        let bookings = self.store.blocking_on_date(date).await?;
        let free = compute_slots(
            date,
            i64::from(service.duration_minutes),
            &rules,
            &bookings,
            now,
        );
        if !free.contains(&time) {
            return Err(SchedulingError::SlotUnavailable);
        }

        let status = if service.requires_approval {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };
        let new = NewBooking {
            service_id: service.id,
            scheduled_date: date,
            scheduled_time: time,
            status,
            lead_name: request.name,
            lead_email: request.email,
            lead_phone: request.phone,
            notes: request.notes,
        };
        let booking = match self.store.insert_if_slot_free(new).await {
            Ok(booking) => booking,
            // Lost the race between the freedom check and the insert.
            Err(DatabaseError::Duplicate) => return Err(SchedulingError::SlotUnavailable),
            Err(err) => return Err(err.into()),
        };

        info!(
            booking_id = %booking.id,
            service = %service.name,
            date = %request.date,
            time = %request.time,
            "booking created"
        );
        self.events.publish(DomainEvent::BookingCreated(booking.clone()));
        Ok((booking, service))
    }

    pub async fn confirm_booking(&self, id: Uuid) -> Result<Booking, SchedulingError> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or(SchedulingError::BookingNotFound)?;
        if booking.status != BookingStatus::Pending {
            return Err(SchedulingError::InvalidTransition);
        }
        let updated = self.store.set_status(id, BookingStatus::Confirmed).await?;
        self.events
            .publish(DomainEvent::BookingConfirmed(updated.clone()));
        Ok(updated)
    }

    pub async fn cancel_booking(&self, id: Uuid) -> Result<Booking, SchedulingError> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or(SchedulingError::BookingNotFound)?;
        if booking.status.is_terminal() {
            return Err(SchedulingError::InvalidTransition);
        }
        let updated = self.store.set_status(id, BookingStatus::Cancelled).await?;
        self.events
            .publish(DomainEvent::BookingCancelled(updated.clone()));
        Ok(updated)
    }

    async fn active_service(&self, id: Uuid) -> Result<Service, SchedulingError> {
        self.store
            .get_service(id)
            .await?
            .filter(|service| service.is_active)
            .ok_or(SchedulingError::ServiceNotFound)
    }
}

/// The site posts either a plain `YYYY-MM-DD` or a full ISO timestamp;
/// only the date part matters here.
pub fn parse_date(raw: &str) -> Result<Date, SchedulingError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    Date::parse(date_part, YMD)
        .map_err(|_| SchedulingError::Validation(format!("Unparseable date: {raw}")))
}

pub fn parse_time(raw: &str) -> Result<Time, SchedulingError> {
    Time::parse(raw, HHMM)
        .map_err(|_| SchedulingError::Validation(format!("Unparseable time: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::MemoryStore;
    use crate::email::RecordingMailer;
    use crate::modules::scheduling::verification::VerificationError;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2030 - 06 - 03 09:00 UTC);

    struct Harness {
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
        gate: Arc<VerificationGate>,
        events: EventBus,
        coordinator: BookingCoordinator,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let gate = Arc::new(VerificationGate::new(
            mailer.clone(),
            Duration::minutes(10),
        ));
        let events = EventBus::new(16);
        let coordinator = BookingCoordinator::new(
            store.clone(),
            gate.clone(),
            events.clone(),
            60,
        );
        Harness {
            store,
            mailer,
            gate,
            events,
            coordinator,
        }
    }

    async fn verified_request(h: &Harness, email: &str, time: &str) -> BookingRequest {
        h.gate.request_code(email, NOW).await.unwrap();
        let code = h.mailer.last_code_for(email).unwrap();
        h.gate.verify_code(email, &code, NOW).unwrap();

        let services = h.store.list_active().await.unwrap();
        let free = services
            .iter()
            .find(|service| !service.requires_approval)
            .unwrap();
        BookingRequest {
            service_id: free.id,
            name: "Ana Monteiro".into(),
            email: email.into(),
            phone: "+244 923 000 000".into(),
            // A Tuesday well after NOW, so "today" filtering stays out of the way.
            date: "2030-06-04".into(),
            time: time.into(),
            notes: None,
            code: None,
        }
    }

    #[tokio::test]
    async fn booking_flows_end_to_end_and_blocks_its_slot() {
        let h = harness();
        let request = verified_request(&h, "x@y.com", "10:00").await;
        let mut rx = h.events.subscribe();

        let (booking, service) = h.coordinator.submit_booking(request, NOW).await.unwrap();
        assert!(!service.requires_approval);
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let event = rx.recv().await.unwrap();
        assert!(event.contains("booking.created"));
        assert!(event.contains("x@y.com"));

        let slots = h
            .coordinator
            .available_slots(parse_date("2030-06-04").unwrap(), Some(service.id), NOW)
            .await
            .unwrap();
        assert!(!slots.contains(&parse_time("10:00").unwrap()));
    }

    #[tokio::test]
    async fn approval_required_service_creates_pending_booking() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        let services = h.store.list_active().await.unwrap();
        let approval = services
            .iter()
            .find(|service| service.requires_approval)
            .unwrap();
        request.service_id = approval.id;

        let (booking, _) = h.coordinator.submit_booking(request, NOW).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_submissions_for_one_slot_yield_one_winner() {
        let h = harness();
        let first = verified_request(&h, "a@example.com", "11:00").await;
        let second = verified_request(&h, "b@example.com", "11:00").await;

        let (left, right) = tokio::join!(
            h.coordinator.submit_booking(first, NOW),
            h.coordinator.submit_booking(second, NOW),
        );

        let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one submission must win the slot");
        let loser = if left.is_err() { left } else { right };
        assert!(matches!(
            loser.unwrap_err(),
            SchedulingError::SlotUnavailable
        ));
    }

    #[tokio::test]
    async fn unverified_email_cannot_book() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        request.email = "stranger@example.com".into();

        let err = h.coordinator.submit_booking(request, NOW).await.unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Verification(VerificationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn verification_is_single_use_across_bookings() {
        let h = harness();
        let request = verified_request(&h, "x@y.com", "10:00").await;
        let mut retry = request.clone();
        retry.time = "12:00".into();

        h.coordinator.submit_booking(request, NOW).await.unwrap();
        let err = h.coordinator.submit_booking(retry, NOW).await.unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Verification(VerificationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn slot_outside_the_grid_is_unavailable() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        request.time = "10:17".into();

        let err = h.coordinator.submit_booking(request, NOW).await.unwrap_err();
        assert!(matches!(err, SchedulingError::SlotUnavailable));
    }

    #[tokio::test]
    async fn closed_day_is_unavailable() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        // 2030-06-02 is a Sunday.
        request.date = "2030-06-02".into();

        let err = h.coordinator.submit_booking(request, NOW).await.unwrap_err();
        assert!(matches!(err, SchedulingError::SlotUnavailable));
    }

    #[tokio::test]
    async fn garbled_date_is_rejected_before_verification() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        request.date = "junho-04".into();

        let err = h.coordinator.submit_booking(request, NOW).await.unwrap_err();
        assert!(matches!(err, SchedulingError::Validation(_)));
    }

    #[tokio::test]
    async fn iso_timestamp_dates_are_accepted() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        request.date = "2030-06-04T00:00:00.000Z".into();

        let (booking, _) = h.coordinator.submit_booking(request, NOW).await.unwrap();
        assert_eq!(booking.scheduled_date, parse_date("2030-06-04").unwrap());
    }

    #[tokio::test]
    async fn confirm_then_cancel_transitions() {
        let h = harness();
        let mut request = verified_request(&h, "x@y.com", "10:00").await;
        let services = h.store.list_active().await.unwrap();
        let approval = services
            .iter()
            .find(|service| service.requires_approval)
            .unwrap();
        request.service_id = approval.id;

        let (booking, _) = h.coordinator.submit_booking(request, NOW).await.unwrap();

        let confirmed = h.coordinator.confirm_booking(booking.id).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        // Confirming twice is a stale transition.
        let err = h.coordinator.confirm_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTransition));

        let cancelled = h.coordinator.cancel_booking(booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = h.coordinator.cancel_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTransition));
    }
}
