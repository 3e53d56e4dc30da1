use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

use crate::db::models::Booking;

/// Domain events published by the scheduling core. Collaborators
/// (dashboard websocket feed, notification dispatch) subscribe to the
/// bus; the core never calls them directly.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    BookingCreated(Booking),
    BookingConfirmed(Booking),
    BookingCancelled(Booking),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated(_) => "booking.created",
            DomainEvent::BookingConfirmed(_) => "booking.confirmed",
            DomainEvent::BookingCancelled(_) => "booking.cancelled",
        }
    }

    fn payload(&self) -> &Booking {
        match self {
            DomainEvent::BookingCreated(booking)
            | DomainEvent::BookingConfirmed(booking)
            | DomainEvent::BookingCancelled(booking) => booking,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<String>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fan-out is best effort; no subscriber just means nobody is
    /// watching right now.
    pub fn publish(&self, event: DomainEvent) {
        let message = json!({
            "event": event.name(),
            "payload": event.payload(),
        })
        .to_string();
        match self.tx.send(message) {
            Ok(receivers) => debug!(event = event.name(), receivers, "domain event published"),
            Err(_) => debug!(event = event.name(), "domain event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<String> {
        self.tx.clone()
    }
}
