// libs/booking-cell/src/store/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::models::{
    Appointment, AppointmentEarning, AppointmentStatus, Block, Customer, CustomerPlan, Location,
    PlanStatus, PlanTemplate, ProviderCommission, Provider, Service, TenantReminderSettings,
    WeeklyHours,
};
use crate::store::{BookingStore, BookingTx, ReminderRepository, StoreError};

const APPOINTMENT_COLUMNS: &str = "id, tenant_id, provider_id, location_id, service_id, service_name, \
     service_duration_minutes, service_price_cents, customer_id, client_name, client_phone, \
     start_at, end_at, status, customer_plan_id, reminder_sent_at, created_at, updated_at";

const PLAN_TEMPLATE_COLUMNS: &str = "id, tenant_id, location_id, name, interval_days, visits_per_interval, \
     combo_service_ids, eligible_service_ids, allowed_weekdays, min_advance_days, \
     min_days_between_visits, allowed_start_minutes, allowed_end_minutes";

const CUSTOMER_PLAN_COLUMNS: &str = "id, tenant_id, customer_id, template_id, status, current_cycle_start, \
     current_cycle_end, visits_used_in_cycle, carry_over_visits, last_payment_status";

// ==============================================================================
// ROW MAPPINGS
// ==============================================================================

#[derive(FromRow)]
struct LocationRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    working_hours: Option<Json<WeeklyHours>>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            name: row.name,
            working_hours: row.working_hours.map(|Json(hours)| hours),
        }
    }
}

#[derive(FromRow)]
struct ProviderRow {
    id: Uuid,
    tenant_id: Uuid,
    location_id: Uuid,
    name: String,
    working_hours: Option<Json<WeeklyHours>>,
    is_active: bool,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            location_id: row.location_id,
            name: row.name,
            working_hours: row.working_hours.map(|Json(hours)| hours),
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct ServiceRow {
    id: Uuid,
    tenant_id: Uuid,
    location_id: Option<Uuid>,
    name: String,
    duration_minutes: i32,
    price_cents: i64,
    is_active: bool,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            location_id: row.location_id,
            name: row.name,
            duration_minutes: row.duration_minutes,
            price_cents: row.price_cents,
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct BlockRow {
    id: Uuid,
    tenant_id: Uuid,
    provider_id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    reason: Option<String>,
}

impl From<BlockRow> for Block {
    fn from(row: BlockRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            provider_id: row.provider_id,
            start_at: row.start_at,
            end_at: row.end_at,
            reason: row.reason,
        }
    }
}

#[derive(FromRow)]
struct AppointmentRow {
    id: Uuid,
    tenant_id: Uuid,
    provider_id: Uuid,
    location_id: Uuid,
    service_id: Uuid,
    service_name: String,
    service_duration_minutes: i32,
    service_price_cents: i64,
    customer_id: Option<Uuid>,
    client_name: String,
    client_phone: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    status: AppointmentStatus,
    customer_plan_id: Option<Uuid>,
    reminder_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            provider_id: row.provider_id,
            location_id: row.location_id,
            service_id: row.service_id,
            service_name: row.service_name,
            service_duration_minutes: row.service_duration_minutes,
            service_price_cents: row.service_price_cents,
            customer_id: row.customer_id,
            client_name: row.client_name,
            client_phone: row.client_phone,
            start_at: row.start_at,
            end_at: row.end_at,
            status: row.status,
            customer_plan_id: row.customer_plan_id,
            reminder_sent_at: row.reminder_sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CustomerRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            name: row.name,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct PlanTemplateRow {
    id: Uuid,
    tenant_id: Uuid,
    location_id: Option<Uuid>,
    name: String,
    interval_days: i32,
    visits_per_interval: i32,
    combo_service_ids: Vec<Uuid>,
    eligible_service_ids: Vec<Uuid>,
    allowed_weekdays: Vec<i32>,
    min_advance_days: Option<i32>,
    min_days_between_visits: Option<i32>,
    allowed_start_minutes: Option<i32>,
    allowed_end_minutes: Option<i32>,
}

impl From<PlanTemplateRow> for PlanTemplate {
    fn from(row: PlanTemplateRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            location_id: row.location_id,
            name: row.name,
            interval_days: row.interval_days,
            visits_per_interval: row.visits_per_interval,
            combo_service_ids: row.combo_service_ids,
            eligible_service_ids: row.eligible_service_ids,
            allowed_weekdays: row.allowed_weekdays,
            min_advance_days: row.min_advance_days,
            min_days_between_visits: row.min_days_between_visits,
            allowed_start_minutes: row.allowed_start_minutes,
            allowed_end_minutes: row.allowed_end_minutes,
        }
    }
}

#[derive(FromRow)]
struct CustomerPlanRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_id: Uuid,
    template_id: Uuid,
    status: PlanStatus,
    current_cycle_start: DateTime<Utc>,
    current_cycle_end: DateTime<Utc>,
    visits_used_in_cycle: i32,
    carry_over_visits: i32,
    last_payment_status: Option<String>,
}

impl From<CustomerPlanRow> for CustomerPlan {
    fn from(row: CustomerPlanRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            customer_id: row.customer_id,
            template_id: row.template_id,
            status: row.status,
            current_cycle_start: row.current_cycle_start,
            current_cycle_end: row.current_cycle_end,
            visits_used_in_cycle: row.visits_used_in_cycle,
            carry_over_visits: row.carry_over_visits,
            last_payment_status: row.last_payment_status,
        }
    }
}

#[derive(FromRow)]
struct CommissionRow {
    id: Uuid,
    tenant_id: Uuid,
    provider_id: Uuid,
    service_id: Option<Uuid>,
    percentage: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CommissionRow> for ProviderCommission {
    fn from(row: CommissionRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            provider_id: row.provider_id,
            service_id: row.service_id,
            percentage: row.percentage,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct EarningRow {
    id: Uuid,
    tenant_id: Uuid,
    appointment_id: Uuid,
    provider_id: Uuid,
    service_price_cents: i64,
    commission_percent: i32,
    provider_earnings_cents: i64,
    house_earnings_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<EarningRow> for AppointmentEarning {
    fn from(row: EarningRow) -> Self {
        Self {
            id: row.id,
            tenant_id: TenantId(row.tenant_id),
            appointment_id: row.appointment_id,
            provider_id: row.provider_id,
            service_price_cents: row.service_price_cents,
            commission_percent: row.commission_percent,
            provider_earnings_cents: row.provider_earnings_cents,
            house_earnings_cents: row.house_earnings_cents,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReminderSettingsRow {
    tenant_id: Uuid,
    enabled: bool,
    hours_before: i32,
}

// ==============================================================================
// STORE
// ==============================================================================

/// Postgres-backed store. Provider rows are locked `FOR UPDATE` to serialize
/// bookings per provider; plan rows are locked before quota accounting.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

#[async_trait]
impl BookingTx for PgTx {
    async fn location(&mut self, id: Uuid) -> Result<Option<Location>, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT id, tenant_id, name, working_hours FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn provider(&mut self, id: Uuid) -> Result<Option<Provider>, StoreError> {
        let row = sqlx::query_as::<_, ProviderRow>(
            "SELECT id, tenant_id, location_id, name, working_hours, is_active FROM providers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn lock_provider_schedule(&mut self, tenant_id: TenantId, provider_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("SELECT id FROM providers WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
            .bind(provider_id)
            .bind(tenant_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        debug!("Locked schedule of provider {}", provider_id);
        Ok(())
    }

    async fn service(&mut self, id: Uuid) -> Result<Option<Service>, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, tenant_id, location_id, name, duration_minutes, price_cents, is_active \
             FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn services_by_ids(&mut self, tenant_id: TenantId, ids: &[Uuid]) -> Result<Vec<Service>, StoreError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, tenant_id, location_id, name, duration_minutes, price_cents, is_active \
             FROM services WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id.as_uuid())
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn blocks_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Block>, StoreError> {
        let rows = sqlx::query_as::<_, BlockRow>(
            "SELECT id, tenant_id, provider_id, start_at, end_at, reason FROM blocks \
             WHERE tenant_id = $1 AND provider_id = $2 AND start_at < $4 AND end_at > $3 \
             ORDER BY start_at",
        )
        .bind(tenant_id.as_uuid())
        .bind(provider_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn appointments_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let sql = format!(
            "SELECT {} FROM appointments \
             WHERE tenant_id = $1 AND provider_id = $2 AND status <> 'cancelled' \
             AND start_at < $4 AND end_at > $3 AND ($5::uuid IS NULL OR id <> $5) \
             ORDER BY start_at",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(provider_id)
            .bind(start)
            .bind(end)
            .bind(exclude)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let sql = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_appointment(&mut self, a: &Appointment) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO appointments ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
            APPOINTMENT_COLUMNS
        );
        sqlx::query(&sql)
            .bind(a.id)
            .bind(a.tenant_id.as_uuid())
            .bind(a.provider_id)
            .bind(a.location_id)
            .bind(a.service_id)
            .bind(&a.service_name)
            .bind(a.service_duration_minutes)
            .bind(a.service_price_cents)
            .bind(a.customer_id)
            .bind(&a.client_name)
            .bind(&a.client_phone)
            .bind(a.start_at)
            .bind(a.end_at)
            .bind(a.status)
            .bind(a.customer_plan_id)
            .bind(a.reminder_sent_at)
            .bind(a.created_at)
            .bind(a.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_appointment_window(
        &mut self,
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE appointments SET start_at = $2, end_at = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(start)
            .bind(end)
            .bind(updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE appointments SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn customer_by_phone(&mut self, tenant_id: TenantId, phone: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, tenant_id, name, phone, created_at FROM customers WHERE tenant_id = $1 AND phone = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(phone)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO customers (id, tenant_id, name, phone, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(customer.id)
            .bind(customer.tenant_id.as_uuid())
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(customer.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn customer_plan(&mut self, id: Uuid) -> Result<Option<CustomerPlan>, StoreError> {
        let sql = format!("SELECT {} FROM customer_plans WHERE id = $1 FOR UPDATE", CUSTOMER_PLAN_COLUMNS);
        let row = sqlx::query_as::<_, CustomerPlanRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn plan_template(&mut self, id: Uuid) -> Result<Option<PlanTemplate>, StoreError> {
        let sql = format!("SELECT {} FROM plan_templates WHERE id = $1", PLAN_TEMPLATE_COLUMNS);
        let row = sqlx::query_as::<_, PlanTemplateRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn latest_plan_visit_before(
        &mut self,
        plan_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        let sql = format!(
            "SELECT {} FROM appointments \
             WHERE customer_plan_id = $1 AND status <> 'cancelled' AND start_at < $2 \
             ORDER BY start_at DESC LIMIT 1",
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(plan_id)
            .bind(before)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn set_plan_status(&mut self, plan_id: Uuid, status: PlanStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE customer_plans SET status = $2 WHERE id = $1")
            .bind(plan_id)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn set_plan_visits_used(&mut self, plan_id: Uuid, visits_used: i32) -> Result<(), StoreError> {
        sqlx::query("UPDATE customer_plans SET visits_used_in_cycle = $2 WHERE id = $1")
            .bind(plan_id)
            .bind(visits_used)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn active_commission_rule(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<Option<ProviderCommission>, StoreError> {
        let row = sqlx::query_as::<_, CommissionRow>(
            "SELECT id, tenant_id, provider_id, service_id, percentage, is_active, created_at \
             FROM provider_commissions \
             WHERE tenant_id = $1 AND provider_id = $2 AND service_id IS NOT DISTINCT FROM $3 \
             AND is_active ORDER BY created_at DESC LIMIT 1",
        )
        .bind(tenant_id.as_uuid())
        .bind(provider_id)
        .bind(service_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn deactivate_commission_rules(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE provider_commissions SET is_active = FALSE \
             WHERE tenant_id = $1 AND provider_id = $2 AND service_id IS NOT DISTINCT FROM $3 AND is_active",
        )
        .bind(tenant_id.as_uuid())
        .bind(provider_id)
        .bind(service_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_commission_rule(&mut self, rule: &ProviderCommission) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO provider_commissions (id, tenant_id, provider_id, service_id, percentage, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(rule.id)
        .bind(rule.tenant_id.as_uuid())
        .bind(rule.provider_id)
        .bind(rule.service_id)
        .bind(rule.percentage)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn earning_for(&mut self, appointment_id: Uuid) -> Result<Option<AppointmentEarning>, StoreError> {
        let row = sqlx::query_as::<_, EarningRow>(
            "SELECT id, tenant_id, appointment_id, provider_id, service_price_cents, commission_percent, \
             provider_earnings_cents, house_earnings_cents, created_at \
             FROM appointment_earnings WHERE appointment_id = $1",
        )
        .bind(appointment_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_earning(&mut self, e: &AppointmentEarning) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO appointment_earnings (id, tenant_id, appointment_id, provider_id, service_price_cents, \
             commission_percent, provider_earnings_cents, house_earnings_cents, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(e.id)
        .bind(e.tenant_id.as_uuid())
        .bind(e.appointment_id)
        .bind(e.provider_id)
        .bind(e.service_price_cents)
        .bind(e.commission_percent)
        .bind(e.provider_earnings_cents)
        .bind(e.house_earnings_cents)
        .bind(e.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_earning(&mut self, appointment_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM appointment_earnings WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl ReminderRepository for PgStore {
    async fn reminder_settings(&self) -> Result<Vec<TenantReminderSettings>, StoreError> {
        let rows = sqlx::query_as::<_, ReminderSettingsRow>(
            "SELECT tenant_id, enabled, hours_before FROM tenant_reminder_settings WHERE enabled ORDER BY tenant_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| TenantReminderSettings {
                tenant_id: TenantId(row.tenant_id),
                enabled: row.enabled,
                hours_before: row.hours_before,
            })
            .collect())
    }

    async fn reminder_candidates(
        &self,
        tenant_id: TenantId,
        from_exclusive: DateTime<Utc>,
        to_inclusive: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let sql = format!(
            "SELECT {} FROM appointments \
             WHERE tenant_id = $1 AND status = 'scheduled' AND reminder_sent_at IS NULL \
             AND start_at > $2 AND start_at <= $3 ORDER BY start_at",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(from_exclusive)
            .bind(to_inclusive)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn claim_reminder(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE appointments SET reminder_sent_at = $2 WHERE id = $1 AND reminder_sent_at IS NULL",
        )
        .bind(appointment_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_reminder(&self, appointment_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE appointments SET reminder_sent_at = NULL WHERE id = $1")
            .bind(appointment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_no_shows(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE appointments SET status = 'no_show', updated_at = NOW() \
             WHERE status = 'scheduled' AND start_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
