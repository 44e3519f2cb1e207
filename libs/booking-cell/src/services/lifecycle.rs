// libs/booking-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::{AppConfig, CommissionTiming};
use shared_models::tenant::TenantId;
use shared_utils::phone::normalize_phone;

use crate::error::BookingError;
use crate::models::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, Customer, Provider,
    RescheduleAppointmentRequest, Service,
};
use crate::services::commission::record_earning_in;
use crate::services::conflict::ensure_window_free;
use crate::services::plan_cycle::{plan_booking_end, PlanCycleValidator};
use crate::services::unit_of_work::unit_of_work;
use crate::store::{BookingStore, BookingTx};
use crate::time::BusinessClock;

/// Create, reschedule, status change and cancellation of appointments.
/// Each public operation is one unit of work.
#[derive(Clone)]
pub struct AppointmentLifecycleManager {
    store: Arc<dyn BookingStore>,
    plan_validator: PlanCycleValidator,
    default_commission_percent: i32,
    commission_timing: CommissionTiming,
}

impl AppointmentLifecycleManager {
    pub fn new(store: Arc<dyn BookingStore>, config: &AppConfig) -> Self {
        Self {
            store,
            plan_validator: PlanCycleValidator::new(BusinessClock::from_offset_minutes(
                config.business_utc_offset_minutes,
            )),
            default_commission_percent: config.default_commission_percent,
            commission_timing: config.commission_timing,
        }
    }

    pub async fn create_appointment(
        &self,
        tenant_id: TenantId,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        self.create_appointment_at(tenant_id, request, Utc::now()).await
    }

    #[instrument(skip(self, request), fields(provider_id = %request.provider_id))]
    pub async fn create_appointment_at(
        &self,
        tenant_id: TenantId,
        request: CreateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Booking {} with provider {} at {}",
            request.service_id, request.provider_id, request.start_at
        );
        let this = self.clone();
        let appointment = unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { this.create_in(tx.as_mut(), tenant_id, request, now).await })
        })
        .await?;

        info!(
            "Appointment {} booked with provider {} ({} - {})",
            appointment.id, appointment.provider_id, appointment.start_at, appointment.end_at
        );
        Ok(appointment)
    }

    #[instrument(skip(self))]
    pub async fn get_appointment(&self, tenant_id: TenantId, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { load_appointment(tx.as_mut(), tenant_id, appointment_id).await })
        })
        .await
    }

    pub async fn reschedule_appointment(
        &self,
        tenant_id: TenantId,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        self.reschedule_appointment_at(tenant_id, appointment_id, request, Utc::now()).await
    }

    #[instrument(skip(self, request))]
    pub async fn reschedule_appointment_at(
        &self,
        tenant_id: TenantId,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let this = self.clone();
        let appointment = unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { this.reschedule_in(tx.as_mut(), tenant_id, appointment_id, request, now).await })
        })
        .await?;

        info!(
            "Appointment {} rescheduled to {} - {}",
            appointment.id, appointment.start_at, appointment.end_at
        );
        Ok(appointment)
    }

    pub async fn update_status(
        &self,
        tenant_id: TenantId,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        self.update_status_at(tenant_id, appointment_id, status, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn update_status_at(
        &self,
        tenant_id: TenantId,
        appointment_id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let this = self.clone();
        unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { this.update_status_in(tx.as_mut(), tenant_id, appointment_id, status, now).await })
        })
        .await
    }

    pub async fn cancel_appointment(&self, tenant_id: TenantId, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        self.cancel_appointment_at(tenant_id, appointment_id, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_appointment_at(
        &self,
        tenant_id: TenantId,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let this = self.clone();
        unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { this.cancel_in(tx.as_mut(), tenant_id, appointment_id, now).await })
        })
        .await
    }

    // ==============================================================================
    // TRANSACTION BODIES
    // ==============================================================================

    async fn create_in(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        request: CreateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let client_name = request.client_name.trim().to_string();
        let client_phone = normalize_phone(&request.client_phone);
        if client_name.is_empty() {
            return Err(BookingError::Validation("clientName is required".to_string()));
        }
        if client_phone.is_empty() {
            return Err(BookingError::Validation("clientPhone is required".to_string()));
        }
        let provider = load_provider(tx, tenant_id, request.provider_id).await?;
        if !provider.is_active {
            return Err(BookingError::ProviderInactive);
        }
        let service = load_service(tx, tenant_id, request.service_id).await?;
        if !service.is_active {
            return Err(BookingError::ServiceInactive);
        }
        if service.location_id.is_some_and(|location| location != provider.location_id) {
            return Err(BookingError::Validation(
                "Service is not offered at this provider's location".to_string(),
            ));
        }

        tx.lock_provider_schedule(tenant_id, provider.id).await?;

        let plan_booking = match request.customer_plan_id {
            Some(plan_id) => Some(
                self.plan_validator
                    .validate(tx, tenant_id, plan_id, &provider, &service, request.start_at, now)
                    .await?,
            ),
            None => None,
        };

        let (end_at, duration_minutes, price_cents, service_name) = match &plan_booking {
            Some(booking) => (
                plan_booking_end(request.start_at, booking),
                booking.duration_minutes,
                booking.price_cents,
                booking.display_name.clone(),
            ),
            None => {
                let end_at = exact_end(request.start_at, request.end_at, service.duration_minutes)?;
                (end_at, service.duration_minutes, service.price_cents, service.name.clone())
            }
        };

        ensure_window_free(tx, tenant_id, provider.id, request.start_at, end_at, None).await?;

        let customer = resolve_customer(tx, tenant_id, &client_name, &client_phone, now).await?;

        if let Some(booking) = &plan_booking {
            let used = self.plan_validator.reserve_visit(tx, booking).await?;
            debug!("Plan {} now has {} visit(s) used", booking.plan.id, used);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            tenant_id,
            provider_id: provider.id,
            location_id: provider.location_id,
            service_id: service.id,
            service_name,
            service_duration_minutes: duration_minutes,
            service_price_cents: price_cents,
            customer_id: Some(customer.id),
            client_name,
            client_phone,
            start_at: request.start_at,
            end_at,
            status: AppointmentStatus::Scheduled,
            customer_plan_id: request.customer_plan_id,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        tx.insert_appointment(&appointment).await?;

        if self.commission_timing == CommissionTiming::OnCreation {
            record_earning_in(tx, &appointment, self.default_commission_percent, now).await?;
        }

        Ok(appointment)
    }

    async fn reschedule_in(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let mut appointment = load_appointment(tx, tenant_id, appointment_id).await?;
        ensure_editable(&appointment)?;

        let start_at = request.start_at;
        let end_at = exact_end(start_at, request.end_at, appointment.service_duration_minutes)?;

        tx.lock_provider_schedule(tenant_id, appointment.provider_id).await?;

        if let Some(plan_id) = appointment.customer_plan_id {
            self.plan_validator
                .ensure_within_cycle(tx, tenant_id, plan_id, start_at)
                .await?;
        }

        ensure_window_free(tx, tenant_id, appointment.provider_id, start_at, end_at, Some(appointment.id)).await?;

        tx.update_appointment_window(appointment.id, start_at, end_at, now).await?;
        appointment.start_at = start_at;
        appointment.end_at = end_at;
        appointment.updated_at = now;
        Ok(appointment)
    }

    async fn update_status_in(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        appointment_id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let mut appointment = load_appointment(tx, tenant_id, appointment_id).await?;

        if appointment.status == status {
            debug!("Appointment {} already {}", appointment.id, status);
            return Ok(appointment);
        }
        if appointment.status == AppointmentStatus::Done {
            return Err(BookingError::AppointmentDone);
        }
        if status == AppointmentStatus::Cancelled {
            return self.cancel_loaded(tx, appointment, now).await;
        }
        if !appointment.status.can_transition_to(status) {
            if appointment.status.is_terminal() {
                return Err(BookingError::TerminalStatus { status: appointment.status });
            }
            return Err(BookingError::InvalidTransition {
                from: appointment.status,
                to: status,
            });
        }

        tx.update_appointment_status(appointment.id, status, now).await?;
        info!("Appointment {} moved {} -> {}", appointment.id, appointment.status, status);
        appointment.status = status;
        appointment.updated_at = now;

        if status == AppointmentStatus::Done {
            record_earning_in(tx, &appointment, self.default_commission_percent, now).await?;
        }

        Ok(appointment)
    }

    async fn cancel_in(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let appointment = load_appointment(tx, tenant_id, appointment_id).await?;
        self.cancel_loaded(tx, appointment, now).await
    }

    async fn cancel_loaded(
        &self,
        tx: &mut dyn BookingTx,
        mut appointment: Appointment,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        match appointment.status {
            AppointmentStatus::Cancelled => {
                debug!("Appointment {} already cancelled", appointment.id);
                return Ok(appointment);
            }
            AppointmentStatus::Done => return Err(BookingError::AppointmentDone),
            _ => {}
        }

        if let Some(plan_id) = appointment.customer_plan_id {
            let used = self.plan_validator.release_visit(tx, plan_id).await?;
            debug!("Plan {} visit restored, {} used", plan_id, used);
        }
        if tx.delete_earning(appointment.id).await? {
            debug!("Earning of appointment {} removed", appointment.id);
        }

        tx.update_appointment_status(appointment.id, AppointmentStatus::Cancelled, now).await?;
        info!("Appointment {} cancelled (was {})", appointment.id, appointment.status);
        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = now;
        Ok(appointment)
    }
}

/// End of a visit lasting exactly `duration_minutes`. A supplied end must
/// match it to the second.
fn exact_end(
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
    duration_minutes: i32,
) -> Result<DateTime<Utc>, BookingError> {
    let expected = i64::from(duration_minutes);
    let expected_end = start_at + Duration::minutes(expected);
    match end_at {
        None => Ok(expected_end),
        Some(end_at) if end_at <= start_at => Err(BookingError::InvalidTimeRange { start: start_at, end: end_at }),
        Some(end_at) if end_at != expected_end => Err(BookingError::DurationMismatch {
            expected,
            actual: (end_at - start_at).num_minutes(),
        }),
        Some(end_at) => Ok(end_at),
    }
}

fn ensure_editable(appointment: &Appointment) -> Result<(), BookingError> {
    match appointment.status {
        AppointmentStatus::Done => Err(BookingError::AppointmentDone),
        status if status.is_terminal() => Err(BookingError::TerminalStatus { status }),
        _ => Ok(()),
    }
}

async fn load_appointment(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    appointment_id: Uuid,
) -> Result<Appointment, BookingError> {
    let appointment = tx
        .appointment(appointment_id)
        .await?
        .ok_or(BookingError::AppointmentNotFound)?;
    if appointment.tenant_id != tenant_id {
        warn!("Tenant {} tried to access appointment {} of another tenant", tenant_id, appointment_id);
        return Err(BookingError::Forbidden("Appointment"));
    }
    Ok(appointment)
}

async fn load_provider(tx: &mut dyn BookingTx, tenant_id: TenantId, provider_id: Uuid) -> Result<Provider, BookingError> {
    let provider = tx.provider(provider_id).await?.ok_or(BookingError::ProviderNotFound)?;
    if provider.tenant_id != tenant_id {
        return Err(BookingError::Forbidden("Provider"));
    }
    Ok(provider)
}

async fn load_service(tx: &mut dyn BookingTx, tenant_id: TenantId, service_id: Uuid) -> Result<Service, BookingError> {
    let service = tx.service(service_id).await?.ok_or(BookingError::ServiceNotFound)?;
    if service.tenant_id != tenant_id {
        return Err(BookingError::Forbidden("Service"));
    }
    Ok(service)
}

/// One customer per (tenant, normalized phone). A different name on a known
/// phone is rejected rather than overwritten.
async fn resolve_customer(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    name: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<Customer, BookingError> {
    if let Some(existing) = tx.customer_by_phone(tenant_id, phone).await? {
        if !existing.name.trim().eq_ignore_ascii_case(name) {
            return Err(BookingError::CustomerNameConflict { existing_name: existing.name });
        }
        return Ok(existing);
    }

    let customer = Customer {
        id: Uuid::new_v4(),
        tenant_id,
        name: name.to_string(),
        phone: phone.to_string(),
        created_at: now,
    };
    tx.insert_customer(&customer).await?;
    debug!("Registered customer {} for tenant {}", customer.id, tenant_id);
    Ok(customer)
}
