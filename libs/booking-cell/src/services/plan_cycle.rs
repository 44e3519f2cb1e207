// libs/booking-cell/src/services/plan_cycle.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::error::BookingError;
use crate::models::{CustomerPlan, PlanStatus, PlanTemplate, Provider, Service};
use crate::services::interval::{format_clock, MINUTES_PER_DAY};
use crate::store::BookingTx;
use crate::time::{utc_day_bounds, BusinessClock};

/// Everything a validated plan booking needs to be written.
#[derive(Debug, Clone)]
pub struct PlanBooking {
    pub plan: CustomerPlan,
    pub template: PlanTemplate,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePosition {
    BeforeStart,
    Within,
    AfterEnd,
}

/// Date-only comparison against `[cycle_start, cycle_end]`, both inclusive.
pub fn cycle_position(plan: &CustomerPlan, date: NaiveDate) -> CyclePosition {
    if date < plan.current_cycle_start.date_naive() {
        CyclePosition::BeforeStart
    } else if date > plan.current_cycle_end.date_naive() {
        CyclePosition::AfterEnd
    } else {
        CyclePosition::Within
    }
}

pub fn ensure_quota(plan: &CustomerPlan, template: &PlanTemplate) -> Result<(), BookingError> {
    let allowed = plan.visit_allowance(template);
    if plan.visits_used_in_cycle + 1 > allowed {
        return Err(BookingError::QuotaExhausted {
            used: plan.visits_used_in_cycle,
            allowed,
        });
    }
    Ok(())
}

/// Checks `[start_minute, start_minute + duration]` against the template's
/// daily window. A missing bound is open.
pub fn ensure_time_window(
    template: &PlanTemplate,
    start_minute: i32,
    duration_minutes: i32,
) -> Result<(), BookingError> {
    if template.allowed_start_minutes.is_none() && template.allowed_end_minutes.is_none() {
        return Ok(());
    }
    let allowed_start = template.allowed_start_minutes.unwrap_or(0);
    let allowed_end = template.allowed_end_minutes.unwrap_or(MINUTES_PER_DAY);
    let end_minute = start_minute + duration_minutes;

    let inside = |minute: i32| minute >= allowed_start && minute <= allowed_end;
    if !inside(start_minute) || !inside(end_minute) {
        return Err(BookingError::OutsideTimeWindow {
            allowed_start: format_clock(allowed_start),
            allowed_end: format_clock(allowed_end),
        });
    }
    Ok(())
}

/// Enforces membership-plan eligibility and keeps the visit counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCycleValidator {
    clock: BusinessClock,
}

impl PlanCycleValidator {
    pub fn new(clock: BusinessClock) -> Self {
        Self { clock }
    }

    /// Runs the eligibility rules in order and stops at the first failure.
    ///
    /// A booking dated after the cycle end marks the plan `late` before
    /// failing with [`BookingError::PlanCycleExpired`]; the caller's unit of
    /// work commits that change.
    #[allow(clippy::too_many_arguments)]
    pub async fn validate(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        plan_id: Uuid,
        provider: &Provider,
        service: &Service,
        start_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<PlanBooking, BookingError> {
        let (plan, template) = self.load(tx, tenant_id, plan_id).await?;

        if plan.status != PlanStatus::Active {
            return Err(BookingError::PlanInactive { status: plan.status.to_string() });
        }
        if template.location_id.is_some_and(|location| location != provider.location_id) {
            return Err(BookingError::PlanLocationMismatch);
        }

        if !template.eligible_service_ids.is_empty() && !template.eligible_service_ids.contains(&service.id) {
            return Err(BookingError::ServiceNotInPlan);
        }

        let weekday = self.clock.weekday(start_at);
        if !template.allowed_weekdays.is_empty() && !template.allowed_weekdays.contains(&(weekday as i32)) {
            return Err(BookingError::WeekdayNotAllowed { weekday });
        }

        let booking_date = start_at.date_naive();
        if let Some(min_days) = template.min_advance_days {
            let days_ahead = (booking_date - now.date_naive()).num_days();
            if days_ahead < i64::from(min_days) {
                return Err(BookingError::BelowMinAdvance { min_days });
            }
        }

        if let Some(min_days) = template.min_days_between_visits {
            let (day_start, _) = utc_day_bounds(booking_date);
            if let Some(last) = tx.latest_plan_visit_before(plan.id, day_start).await? {
                let last_visit = last.start_at.date_naive();
                if (booking_date - last_visit).num_days() < i64::from(min_days) {
                    return Err(BookingError::BelowMinGap { min_days, last_visit });
                }
            }
        }

        self.ensure_cycle(tx, &plan, booking_date).await?;
        ensure_quota(&plan, &template)?;

        let (duration_minutes, price_cents, display_name) = if template.combo_service_ids.is_empty() {
            (service.duration_minutes, service.price_cents, service.name.clone())
        } else {
            let found = tx.services_by_ids(tenant_id, &template.combo_service_ids).await?;
            // One entry per listed id, so a service listed twice counts twice.
            let combo = template
                .combo_service_ids
                .iter()
                .map(|id| found.iter().find(|s| s.id == *id))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    warn!("Plan template {} references missing combo services", template.id);
                    BookingError::ServiceNotFound
                })?;
            (
                combo.iter().map(|s| s.duration_minutes).sum(),
                combo.iter().map(|s| s.price_cents).sum(),
                template.name.clone(),
            )
        };

        ensure_time_window(&template, self.clock.minute_of_day(start_at), duration_minutes)?;

        debug!(
            "Plan {} accepts booking at {} ({} min, {} cents)",
            plan.id, start_at, duration_minutes, price_cents
        );
        Ok(PlanBooking {
            plan,
            template,
            duration_minutes,
            price_cents,
            display_name,
        })
    }

    /// Counts the visit against the cycle. Call in the same transaction that
    /// inserts the appointment.
    pub async fn reserve_visit(&self, tx: &mut dyn BookingTx, booking: &PlanBooking) -> Result<i32, BookingError> {
        ensure_quota(&booking.plan, &booking.template)?;
        let used = booking.plan.visits_used_in_cycle + 1;
        tx.set_plan_visits_used(booking.plan.id, used).await?;
        Ok(used)
    }

    /// Gives a visit back to the cycle, never going below zero.
    pub async fn release_visit(&self, tx: &mut dyn BookingTx, plan_id: Uuid) -> Result<i32, BookingError> {
        let Some(plan) = tx.customer_plan(plan_id).await? else {
            warn!("Appointment references missing plan {}", plan_id);
            return Ok(0);
        };
        let used = (plan.visits_used_in_cycle - 1).max(0);
        tx.set_plan_visits_used(plan_id, used).await?;
        Ok(used)
    }

    /// Cycle membership only; used when an existing plan booking moves.
    pub async fn ensure_within_cycle(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        plan_id: Uuid,
        start_at: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let plan = tx.customer_plan(plan_id).await?.ok_or(BookingError::PlanNotFound)?;
        if plan.tenant_id != tenant_id {
            return Err(BookingError::Forbidden("Customer plan"));
        }
        self.ensure_cycle(tx, &plan, start_at.date_naive()).await
    }

    async fn load(
        &self,
        tx: &mut dyn BookingTx,
        tenant_id: TenantId,
        plan_id: Uuid,
    ) -> Result<(CustomerPlan, PlanTemplate), BookingError> {
        let plan = tx.customer_plan(plan_id).await?.ok_or(BookingError::PlanNotFound)?;
        if plan.tenant_id != tenant_id {
            return Err(BookingError::Forbidden("Customer plan"));
        }
        let template = tx
            .plan_template(plan.template_id)
            .await?
            .ok_or(BookingError::PlanTemplateNotFound)?;
        Ok((plan, template))
    }

    async fn ensure_cycle(
        &self,
        tx: &mut dyn BookingTx,
        plan: &CustomerPlan,
        date: NaiveDate,
    ) -> Result<(), BookingError> {
        match cycle_position(plan, date) {
            CyclePosition::Within => Ok(()),
            CyclePosition::BeforeStart => Err(BookingError::BeforeCycleStart {
                cycle_start: plan.current_cycle_start.date_naive(),
            }),
            CyclePosition::AfterEnd => {
                if plan.status != PlanStatus::Late {
                    tx.set_plan_status(plan.id, PlanStatus::Late).await?;
                    info!("Plan {} marked late: booking on {} is past cycle end", plan.id, date);
                }
                Err(BookingError::PlanCycleExpired {
                    cycle_end: plan.current_cycle_end.date_naive(),
                })
            }
        }
    }
}

/// End of a plan booking: the start plus the plan's effective duration.
pub fn plan_booking_end(start_at: DateTime<Utc>, booking: &PlanBooking) -> DateTime<Utc> {
    start_at + Duration::minutes(i64::from(booking.duration_minutes))
}
