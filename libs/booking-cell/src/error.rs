// libs/booking-cell/src/error.rs
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::AppointmentStatus;
use crate::store::StoreError;

/// Coarse classification used by the HTTP layer and by callers deciding
/// whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    DomainRule,
    StateConflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum BookingError {
    // Validation
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("End time {end} must be after start time {start}")]
    InvalidTimeRange { start: DateTime<Utc>, end: DateTime<Utc> },

    #[error("Appointment duration {actual} min does not match the service duration {expected} min")]
    DurationMismatch { expected: i64, actual: i64 },

    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    // Not found
    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Customer plan not found")]
    PlanNotFound,

    #[error("Plan template not found")]
    PlanTemplateNotFound,

    // Tenant scope
    #[error("{0} belongs to a different tenant")]
    Forbidden(&'static str),

    #[error("Provider is inactive")]
    ProviderInactive,

    #[error("Service is inactive")]
    ServiceInactive,

    // Conflicts
    #[error("Provider is blocked between {start} and {end}")]
    BlockConflict { start: DateTime<Utc>, end: DateTime<Utc> },

    #[error("Provider already has appointment {existing_id} in this time range")]
    AppointmentConflict { existing_id: Uuid },

    #[error("A customer with this phone is already registered as {existing_name}")]
    CustomerNameConflict { existing_name: String },

    // Plan rules
    #[error("Plan is not active (status: {status})")]
    PlanInactive { status: String },

    #[error("Plan is not valid at this provider's location")]
    PlanLocationMismatch,

    #[error("Service is not included in the plan")]
    ServiceNotInPlan,

    #[error("The plan does not allow bookings on this weekday")]
    WeekdayNotAllowed { weekday: u32 },

    #[error("The plan requires booking at least {min_days} days in advance")]
    BelowMinAdvance { min_days: i32 },

    #[error("The plan requires at least {min_days} days between visits (last visit on {last_visit})")]
    BelowMinGap { min_days: i32, last_visit: NaiveDate },

    #[error("Appointment date is before the current plan cycle starts on {cycle_start}")]
    BeforeCycleStart { cycle_start: NaiveDate },

    /// Rejected write that still persisted the plan's transition to `late`.
    #[error("Plan cycle ended on {cycle_end}; the plan is now late")]
    PlanCycleExpired { cycle_end: NaiveDate },

    #[error("No visits left in the current plan cycle ({used} of {allowed} used)")]
    QuotaExhausted { used: i32, allowed: i32 },

    #[error("The plan only allows visits between {allowed_start} and {allowed_end}")]
    OutsideTimeWindow { allowed_start: String, allowed_end: String },

    // State
    #[error("Completed appointments cannot be changed")]
    AppointmentDone,

    #[error("Appointment is {status} and can no longer be changed")]
    TerminalStatus { status: AppointmentStatus },

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_)
            | BookingError::InvalidTimeRange { .. }
            | BookingError::DurationMismatch { .. }
            | BookingError::InvalidWorkingHours(_) => ErrorKind::Validation,

            BookingError::ProviderNotFound
            | BookingError::ServiceNotFound
            | BookingError::AppointmentNotFound
            | BookingError::PlanNotFound
            | BookingError::PlanTemplateNotFound => ErrorKind::NotFound,

            BookingError::Forbidden(_) => ErrorKind::Forbidden,

            BookingError::BlockConflict { .. }
            | BookingError::AppointmentConflict { .. }
            | BookingError::CustomerNameConflict { .. } => ErrorKind::Conflict,

            BookingError::ProviderInactive
            | BookingError::ServiceInactive
            | BookingError::PlanInactive { .. }
            | BookingError::PlanLocationMismatch
            | BookingError::ServiceNotInPlan
            | BookingError::WeekdayNotAllowed { .. }
            | BookingError::BelowMinAdvance { .. }
            | BookingError::BelowMinGap { .. }
            | BookingError::BeforeCycleStart { .. }
            | BookingError::PlanCycleExpired { .. }
            | BookingError::QuotaExhausted { .. }
            | BookingError::OutsideTimeWindow { .. } => ErrorKind::DomainRule,

            BookingError::AppointmentDone
            | BookingError::TerminalStatus { .. }
            | BookingError::InvalidTransition { .. } => ErrorKind::StateConflict,

            BookingError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable reason, returned alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "invalid_request",
            BookingError::InvalidTimeRange { .. } => "invalid_time_range",
            BookingError::DurationMismatch { .. } => "duration_mismatch",
            BookingError::InvalidWorkingHours(_) => "invalid_working_hours",
            BookingError::ProviderNotFound => "provider_not_found",
            BookingError::ServiceNotFound => "service_not_found",
            BookingError::AppointmentNotFound => "appointment_not_found",
            BookingError::PlanNotFound => "plan_not_found",
            BookingError::PlanTemplateNotFound => "plan_template_not_found",
            BookingError::Forbidden(_) => "forbidden",
            BookingError::ProviderInactive => "provider_inactive",
            BookingError::ServiceInactive => "service_inactive",
            BookingError::BlockConflict { .. } => "block_conflict",
            BookingError::AppointmentConflict { .. } => "appointment_conflict",
            BookingError::CustomerNameConflict { .. } => "customer_name_conflict",
            BookingError::PlanInactive { .. } => "plan_inactive",
            BookingError::PlanLocationMismatch => "plan_location_mismatch",
            BookingError::ServiceNotInPlan => "service_not_in_plan",
            BookingError::WeekdayNotAllowed { .. } => "plan_weekday_not_allowed",
            BookingError::BelowMinAdvance { .. } => "plan_min_advance",
            BookingError::BelowMinGap { .. } => "plan_min_gap",
            BookingError::BeforeCycleStart { .. } => "plan_before_cycle",
            BookingError::PlanCycleExpired { .. } => "plan_cycle_expired",
            BookingError::QuotaExhausted { .. } => "plan_quota_exhausted",
            BookingError::OutsideTimeWindow { .. } => "plan_time_window",
            BookingError::AppointmentDone => "appointment_done",
            BookingError::TerminalStatus { .. } => "appointment_terminal",
            BookingError::InvalidTransition { .. } => "invalid_status_transition",
            BookingError::Store(_) => "internal",
        }
    }

    /// True for the one rejection whose side effect (plan marked late) must
    /// still be committed.
    pub fn persists_side_effects(&self) -> bool {
        matches!(self, BookingError::PlanCycleExpired { .. })
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => AppError::ValidationError(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Forbidden => AppError::Forbidden(message),
            ErrorKind::Conflict | ErrorKind::StateConflict => AppError::Conflict(message),
            ErrorKind::DomainRule => AppError::RuleViolation {
                code: err.code().to_string(),
                message,
            },
            ErrorKind::Internal => AppError::Database(message),
        }
    }
}
