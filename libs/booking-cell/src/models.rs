// libs/booking-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::tenant::TenantId;

// ==============================================================================
// SCHEDULING ENTITIES
// ==============================================================================

/// Weekly working-hours template: weekday key (`sun`..`sat`) to a list of
/// `["HH:MM", "HH:MM"]` pairs, end exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyHours(pub BTreeMap<String, Vec<[String; 2]>>);

impl WeeklyHours {
    pub fn day(&self, key: &str) -> Option<&[[String; 2]]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn with_day(mut self, key: &str, ranges: &[(&str, &str)]) -> Self {
        self.0.insert(
            key.to_string(),
            ranges
                .iter()
                .map(|(start, end)| [start.to_string(), end.to_string()])
                .collect(),
        );
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub working_hours: Option<WeeklyHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub location_id: Uuid,
    pub name: String,
    pub working_hours: Option<WeeklyHours>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub location_id: Option<Uuid>,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub is_active: bool,
}

/// Provider-scoped unavailability. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub provider_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    InService,
    Done,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::InService => "in_service",
            AppointmentStatus::Done => "done",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses accept no further status edits or reschedules.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Done | AppointmentStatus::NoShow | AppointmentStatus::Cancelled
        )
    }

    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::InService,
                AppointmentStatus::Done,
                AppointmentStatus::NoShow,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InService => &[
                AppointmentStatus::Done,
                AppointmentStatus::NoShow,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Done | AppointmentStatus::NoShow | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "in_service" => Ok(AppointmentStatus::InService),
            "done" => Ok(AppointmentStatus::Done),
            "no_show" => Ok(AppointmentStatus::NoShow),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

/// A booked visit. `service_name`, `service_duration_minutes` and
/// `service_price_cents` are snapshots taken at booking time and stay
/// authoritative when the service record changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub service_duration_minutes: i32,
    pub service_price_cents: i64,
    pub customer_id: Option<Uuid>,
    pub client_name: String,
    pub client_phone: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub customer_plan_id: Option<Uuid>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One per (tenant, normalized phone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// MEMBERSHIP PLANS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Late,
    Suspended,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Late => "late",
            PlanStatus::Suspended => "suspended",
            PlanStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a recurring plan. Empty vectors and `None` mean "unrestricted".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTemplate {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub location_id: Option<Uuid>,
    pub name: String,
    pub interval_days: i32,
    pub visits_per_interval: i32,
    pub combo_service_ids: Vec<Uuid>,
    pub eligible_service_ids: Vec<Uuid>,
    /// 0 = Sunday .. 6 = Saturday
    pub allowed_weekdays: Vec<i32>,
    pub min_advance_days: Option<i32>,
    pub min_days_between_visits: Option<i32>,
    pub allowed_start_minutes: Option<i32>,
    pub allowed_end_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPlan {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub customer_id: Uuid,
    pub template_id: Uuid,
    pub status: PlanStatus,
    pub current_cycle_start: DateTime<Utc>,
    pub current_cycle_end: DateTime<Utc>,
    pub visits_used_in_cycle: i32,
    pub carry_over_visits: i32,
    pub last_payment_status: Option<String>,
}

impl CustomerPlan {
    pub fn visit_allowance(&self, template: &PlanTemplate) -> i32 {
        template.visits_per_interval + self.carry_over_visits
    }
}

// ==============================================================================
// COMMISSIONS & EARNINGS
// ==============================================================================

/// Commission rule keyed by (tenant, provider, service). `service_id = None`
/// is the provider's default rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCommission {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub provider_id: Uuid,
    pub service_id: Option<Uuid>,
    pub percentage: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSource {
    Service,
    ProviderDefault,
    SystemDefault,
}

/// Derived 1:1 financial record of an appointment. Never recomputed in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEarning {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub appointment_id: Uuid,
    pub provider_id: Uuid,
    pub service_price_cents: i64,
    pub commission_percent: i32,
    pub provider_earnings_cents: i64,
    pub house_earnings_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantReminderSettings {
    pub tenant_id: TenantId,
    pub enabled: bool,
    pub hours_before: i32,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub client_name: String,
    pub client_phone: String,
    pub customer_plan_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub step_minutes: Option<i32>,
}

/// Free interval rendered as clock times (`"09:00"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeInterval {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookableSlot {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCommissionRequest {
    pub service_id: Option<Uuid>,
    pub percentage: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionLookupQuery {
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCommission {
    pub provider_id: Uuid,
    pub service_id: Option<Uuid>,
    pub percentage: i32,
    pub source: CommissionSource,
    pub rule_id: Option<Uuid>,
}
