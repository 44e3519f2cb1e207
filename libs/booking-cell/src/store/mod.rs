// libs/booking-cell/src/store/mod.rs
//! Persistence seams for the booking engine.
//!
//! Every lifecycle operation runs against one [`BookingTx`]; lookups by id
//! are not tenant-filtered so callers can tell "missing" from "someone
//! else's". Range queries always are.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::models::{
    Appointment, AppointmentEarning, AppointmentStatus, Block, Customer, CustomerPlan, Location,
    PlanStatus, PlanTemplate, ProviderCommission, Provider, Service, TenantReminderSettings,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored row is malformed: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, StoreError>;
}

#[async_trait]
pub trait BookingTx: Send {
    async fn location(&mut self, id: Uuid) -> Result<Option<Location>, StoreError>;
    async fn provider(&mut self, id: Uuid) -> Result<Option<Provider>, StoreError>;

    /// Serializes writers on one provider's calendar until the transaction ends.
    async fn lock_provider_schedule(&mut self, tenant_id: TenantId, provider_id: Uuid) -> Result<(), StoreError>;

    async fn service(&mut self, id: Uuid) -> Result<Option<Service>, StoreError>;
    async fn services_by_ids(&mut self, tenant_id: TenantId, ids: &[Uuid]) -> Result<Vec<Service>, StoreError>;

    async fn blocks_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Block>, StoreError>;

    /// Non-cancelled appointments overlapping `[start, end)`.
    async fn appointments_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError>;
    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError>;
    async fn update_appointment_window(
        &mut self,
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn customer_by_phone(&mut self, tenant_id: TenantId, phone: &str) -> Result<Option<Customer>, StoreError>;
    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), StoreError>;

    /// Loads the plan and locks it for quota accounting.
    async fn customer_plan(&mut self, id: Uuid) -> Result<Option<CustomerPlan>, StoreError>;
    async fn plan_template(&mut self, id: Uuid) -> Result<Option<PlanTemplate>, StoreError>;

    /// Most recent non-cancelled appointment under the plan starting before `before`.
    async fn latest_plan_visit_before(
        &mut self,
        plan_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError>;
    async fn set_plan_status(&mut self, plan_id: Uuid, status: PlanStatus) -> Result<(), StoreError>;
    async fn set_plan_visits_used(&mut self, plan_id: Uuid, visits_used: i32) -> Result<(), StoreError>;

    async fn active_commission_rule(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<Option<ProviderCommission>, StoreError>;
    async fn deactivate_commission_rules(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<u64, StoreError>;
    async fn insert_commission_rule(&mut self, rule: &ProviderCommission) -> Result<(), StoreError>;

    async fn earning_for(&mut self, appointment_id: Uuid) -> Result<Option<AppointmentEarning>, StoreError>;
    async fn insert_earning(&mut self, earning: &AppointmentEarning) -> Result<(), StoreError>;
    async fn delete_earning(&mut self, appointment_id: Uuid) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Non-transactional access used by the periodic sweeps.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Settings of every tenant with reminders enabled.
    async fn reminder_settings(&self) -> Result<Vec<TenantReminderSettings>, StoreError>;

    /// Scheduled, not-yet-reminded appointments with `from < start_at <= to`.
    async fn reminder_candidates(
        &self,
        tenant_id: TenantId,
        from_exclusive: DateTime<Utc>,
        to_inclusive: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Compare-and-swap on `reminder_sent_at IS NULL`. True when this caller won.
    async fn claim_reminder(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn release_reminder(&self, appointment_id: Uuid) -> Result<(), StoreError>;

    /// Moves every scheduled appointment starting before `before` to no_show.
    async fn mark_no_shows(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}
