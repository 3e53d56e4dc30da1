use std::sync::Arc;

use crate::config;
use crate::db::repositories::SchedulingStore;
use crate::events::EventBus;
use crate::modules::scheduling::coordinator::BookingCoordinator;
use crate::modules::scheduling::verification::VerificationGate;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SchedulingStore>,
    pub env: config::Config,
    pub events: EventBus,
    pub verification: Arc<VerificationGate>,
    pub coordinator: Arc<BookingCoordinator>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        env: config::Config,
        events: EventBus,
        verification: Arc<VerificationGate>,
    ) -> Self {
        let coordinator = Arc::new(BookingCoordinator::new(
            store.clone(),
            verification.clone(),
            events.clone(),
            env.scheduling.default_slot_minutes,
        ));
        Self {
            store,
            env,
            events,
            verification,
            coordinator,
        }
    }
}
