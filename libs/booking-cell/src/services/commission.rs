// libs/booking-cell/src/services/commission.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::error::BookingError;
use crate::models::{
    Appointment, AppointmentEarning, CommissionSource, ProviderCommission, ResolvedCommission,
    UpsertCommissionRequest,
};
use crate::services::unit_of_work::unit_of_work;
use crate::store::{BookingStore, BookingTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsSplit {
    pub provider_cents: i64,
    pub house_cents: i64,
}

/// `provider = round(price * pct / 100)` rounding half away from zero,
/// `house = price - provider`.
pub fn split_earnings(price_cents: i64, percentage: i32) -> EarningsSplit {
    let price = price_cents.max(0);
    let pct = i128::from(percentage.clamp(0, 100));
    // Widened so large prices cannot overflow; the result never exceeds `price`.
    let provider_cents = ((i128::from(price) * pct + 50) / 100) as i64;
    EarningsSplit {
        provider_cents,
        house_cents: price - provider_cents,
    }
}

/// Service rule, then provider default rule, then the configured default.
pub async fn resolve_in(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    provider_id: Uuid,
    service_id: Option<Uuid>,
    default_percent: i32,
) -> Result<ResolvedCommission, BookingError> {
    if let Some(service_id) = service_id {
        if let Some(rule) = tx.active_commission_rule(tenant_id, provider_id, Some(service_id)).await? {
            return Ok(ResolvedCommission {
                provider_id,
                service_id: Some(service_id),
                percentage: rule.percentage,
                source: CommissionSource::Service,
                rule_id: Some(rule.id),
            });
        }
    }

    if let Some(rule) = tx.active_commission_rule(tenant_id, provider_id, None).await? {
        return Ok(ResolvedCommission {
            provider_id,
            service_id,
            percentage: rule.percentage,
            source: CommissionSource::ProviderDefault,
            rule_id: Some(rule.id),
        });
    }

    Ok(ResolvedCommission {
        provider_id,
        service_id,
        percentage: default_percent,
        source: CommissionSource::SystemDefault,
        rule_id: None,
    })
}

/// Creates the appointment's earning record unless one already exists.
/// Existing records are returned untouched.
pub async fn record_earning_in(
    tx: &mut dyn BookingTx,
    appointment: &Appointment,
    default_percent: i32,
    now: DateTime<Utc>,
) -> Result<AppointmentEarning, BookingError> {
    if let Some(existing) = tx.earning_for(appointment.id).await? {
        debug!("Earning for appointment {} already recorded", appointment.id);
        return Ok(existing);
    }

    let commission = resolve_in(
        tx,
        appointment.tenant_id,
        appointment.provider_id,
        Some(appointment.service_id),
        default_percent,
    )
    .await?;
    let split = split_earnings(appointment.service_price_cents, commission.percentage);

    let earning = AppointmentEarning {
        id: Uuid::new_v4(),
        tenant_id: appointment.tenant_id,
        appointment_id: appointment.id,
        provider_id: appointment.provider_id,
        service_price_cents: appointment.service_price_cents,
        commission_percent: commission.percentage,
        provider_earnings_cents: split.provider_cents,
        house_earnings_cents: split.house_cents,
        created_at: now,
    };
    tx.insert_earning(&earning).await?;

    info!(
        "Recorded earning for appointment {}: {}% of {} ({:?})",
        appointment.id, commission.percentage, appointment.service_price_cents, commission.source
    );
    Ok(earning)
}

async fn ensure_provider_in_tenant(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    provider_id: Uuid,
) -> Result<(), BookingError> {
    let provider = tx.provider(provider_id).await?.ok_or(BookingError::ProviderNotFound)?;
    if provider.tenant_id != tenant_id {
        return Err(BookingError::Forbidden("Provider"));
    }
    Ok(())
}

/// Commission rule lookup and maintenance.
#[derive(Clone)]
pub struct CommissionService {
    store: Arc<dyn BookingStore>,
    default_percent: i32,
}

impl CommissionService {
    pub fn new(store: Arc<dyn BookingStore>, default_percent: i32) -> Self {
        Self { store, default_percent }
    }

    #[instrument(skip(self))]
    pub async fn lookup(
        &self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<ResolvedCommission, BookingError> {
        let default_percent = self.default_percent;
        unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                ensure_provider_in_tenant(tx.as_mut(), tenant_id, provider_id).await?;
                resolve_in(tx.as_mut(), tenant_id, provider_id, service_id, default_percent).await
            })
        })
        .await
    }

    /// Replaces the active rule for `(provider, service)`; the previous one is
    /// deactivated, never edited.
    #[instrument(skip(self, request))]
    pub async fn upsert_rule(
        &self,
        tenant_id: TenantId,
        provider_id: Uuid,
        request: UpsertCommissionRequest,
    ) -> Result<ProviderCommission, BookingError> {
        if !(0..=100).contains(&request.percentage) {
            return Err(BookingError::Validation(format!(
                "percentage must be between 0 and 100, got {}",
                request.percentage
            )));
        }

        unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                ensure_provider_in_tenant(tx.as_mut(), tenant_id, provider_id).await?;

                if let Some(service_id) = request.service_id {
                    let service = tx.service(service_id).await?.ok_or(BookingError::ServiceNotFound)?;
                    if service.tenant_id != tenant_id {
                        return Err(BookingError::Forbidden("Service"));
                    }
                }

                let replaced = tx
                    .deactivate_commission_rules(tenant_id, provider_id, request.service_id)
                    .await?;

                let rule = ProviderCommission {
                    id: Uuid::new_v4(),
                    tenant_id,
                    provider_id,
                    service_id: request.service_id,
                    percentage: request.percentage,
                    is_active: true,
                    created_at: Utc::now(),
                };
                tx.insert_commission_rule(&rule).await?;

                info!(
                    "Commission for provider {} / service {:?} set to {}% ({} rule(s) replaced)",
                    provider_id, request.service_id, request.percentage, replaced
                );
                Ok(rule)
            })
        })
        .await
    }
}
