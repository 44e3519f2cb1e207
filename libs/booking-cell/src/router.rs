// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;
use crate::services::availability::AvailabilityService;
use crate::services::commission::CommissionService;
use crate::services::lifecycle::AppointmentLifecycleManager;
use crate::store::BookingStore;

#[derive(Clone)]
pub struct BookingState {
    pub lifecycle: AppointmentLifecycleManager,
    pub availability: AvailabilityService,
    pub commissions: CommissionService,
}

impl BookingState {
    pub fn new(store: Arc<dyn BookingStore>, config: &AppConfig) -> Self {
        Self {
            lifecycle: AppointmentLifecycleManager::new(store.clone(), config),
            availability: AvailabilityService::new(store.clone()),
            commissions: CommissionService::new(store, config.default_commission_percent),
        }
    }
}

pub fn appointment_routes(state: BookingState) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(state)
}

pub fn provider_routes(state: BookingState) -> Router {
    Router::new()
        .route("/{provider_id}/availability", get(handlers::get_day_availability))
        .route("/{provider_id}/slots", get(handlers::get_bookable_slots))
        .route(
            "/{provider_id}/commission",
            get(handlers::get_commission).put(handlers::upsert_commission),
        )
        .with_state(state)
}
