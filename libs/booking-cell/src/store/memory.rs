// libs/booking-cell/src/store/memory.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::models::{
    Appointment, AppointmentEarning, AppointmentStatus, Block, Customer, CustomerPlan, Location,
    PlanStatus, PlanTemplate, ProviderCommission, Provider, Service, TenantReminderSettings,
};
use crate::store::{BookingStore, BookingTx, ReminderRepository, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    locations: HashMap<Uuid, Location>,
    providers: HashMap<Uuid, Provider>,
    services: HashMap<Uuid, Service>,
    blocks: Vec<Block>,
    appointments: HashMap<Uuid, Appointment>,
    customers: HashMap<Uuid, Customer>,
    plan_templates: HashMap<Uuid, PlanTemplate>,
    customer_plans: HashMap<Uuid, CustomerPlan>,
    commissions: Vec<ProviderCommission>,
    earnings: HashMap<Uuid, AppointmentEarning>,
    reminder_settings: HashMap<TenantId, TenantReminderSettings>,
}

/// In-process store used when no database is configured, and by tests.
///
/// A transaction owns the state lock for its whole lifetime and works on a
/// copy, so transactions are fully serialized and rollback is a drop.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_location(&self, location: Location) {
        self.state.lock().await.locations.insert(location.id, location);
    }

    pub async fn seed_provider(&self, provider: Provider) {
        self.state.lock().await.providers.insert(provider.id, provider);
    }

    pub async fn seed_service(&self, service: Service) {
        self.state.lock().await.services.insert(service.id, service);
    }

    pub async fn seed_block(&self, block: Block) {
        self.state.lock().await.blocks.push(block);
    }

    pub async fn seed_appointment(&self, appointment: Appointment) {
        self.state.lock().await.appointments.insert(appointment.id, appointment);
    }

    pub async fn seed_customer(&self, customer: Customer) {
        self.state.lock().await.customers.insert(customer.id, customer);
    }

    pub async fn seed_plan_template(&self, template: PlanTemplate) {
        self.state.lock().await.plan_templates.insert(template.id, template);
    }

    pub async fn seed_customer_plan(&self, plan: CustomerPlan) {
        self.state.lock().await.customer_plans.insert(plan.id, plan);
    }

    pub async fn seed_commission_rule(&self, rule: ProviderCommission) {
        self.state.lock().await.commissions.push(rule);
    }

    pub async fn seed_reminder_settings(&self, settings: TenantReminderSettings) {
        self.state.lock().await.reminder_settings.insert(settings.tenant_id, settings);
    }

    pub async fn appointment(&self, id: Uuid) -> Option<Appointment> {
        self.state.lock().await.appointments.get(&id).cloned()
    }

    pub async fn customer_plan(&self, id: Uuid) -> Option<CustomerPlan> {
        self.state.lock().await.customer_plans.get(&id).cloned()
    }

    pub async fn earning_for(&self, appointment_id: Uuid) -> Option<AppointmentEarning> {
        self.state.lock().await.earnings.get(&appointment_id).cloned()
    }

    pub async fn customers(&self, tenant_id: TenantId) -> Vec<Customer> {
        self.state
            .lock()
            .await
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub async fn commission_rules(&self, tenant_id: TenantId, provider_id: Uuid) -> Vec<ProviderCommission> {
        self.state
            .lock()
            .await
            .commissions
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.provider_id == provider_id)
            .cloned()
            .collect()
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

fn overlaps(a_start: DateTime<Utc>, a_end: DateTime<Utc>, b_start: DateTime<Utc>, b_end: DateTime<Utc>) -> bool {
    a_start < b_end && b_start < a_end
}

impl MemoryTx {
    fn appointment_mut(&mut self, id: Uuid) -> Result<&mut Appointment, StoreError> {
        self.working
            .appointments
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("appointment {} vanished mid-transaction", id)))
    }

    fn plan_mut(&mut self, id: Uuid) -> Result<&mut CustomerPlan, StoreError> {
        self.working
            .customer_plans
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("customer plan {} vanished mid-transaction", id)))
    }
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn location(&mut self, id: Uuid) -> Result<Option<Location>, StoreError> {
        Ok(self.working.locations.get(&id).cloned())
    }

    async fn provider(&mut self, id: Uuid) -> Result<Option<Provider>, StoreError> {
        Ok(self.working.providers.get(&id).cloned())
    }

    async fn lock_provider_schedule(&mut self, _tenant_id: TenantId, _provider_id: Uuid) -> Result<(), StoreError> {
        // The transaction already holds the whole store.
        Ok(())
    }

    async fn service(&mut self, id: Uuid) -> Result<Option<Service>, StoreError> {
        Ok(self.working.services.get(&id).cloned())
    }

    async fn services_by_ids(&mut self, tenant_id: TenantId, ids: &[Uuid]) -> Result<Vec<Service>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.services.get(id))
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn blocks_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Block>, StoreError> {
        let mut blocks: Vec<Block> = self
            .working
            .blocks
            .iter()
            .filter(|b| b.tenant_id == tenant_id && b.provider_id == provider_id)
            .filter(|b| overlaps(b.start_at, b.end_at, start, end))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.start_at);
        Ok(blocks)
    }

    async fn appointments_overlapping(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut appointments: Vec<Appointment> = self
            .working
            .appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.provider_id == provider_id)
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .filter(|a| Some(a.id) != exclude)
            .filter(|a| overlaps(a.start_at, a.end_at, start, end))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_at);
        Ok(appointments)
    }

    async fn appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.working.appointments.get(&id).cloned())
    }

    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError> {
        self.working.appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn update_appointment_window(
        &mut self,
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let appointment = self.appointment_mut(id)?;
        appointment.start_at = start;
        appointment.end_at = end;
        appointment.updated_at = updated_at;
        Ok(())
    }

    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let appointment = self.appointment_mut(id)?;
        appointment.status = status;
        appointment.updated_at = updated_at;
        Ok(())
    }

    async fn customer_by_phone(&mut self, tenant_id: TenantId, phone: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .working
            .customers
            .values()
            .find(|c| c.tenant_id == tenant_id && c.phone == phone)
            .cloned())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), StoreError> {
        self.working.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn customer_plan(&mut self, id: Uuid) -> Result<Option<CustomerPlan>, StoreError> {
        Ok(self.working.customer_plans.get(&id).cloned())
    }

    async fn plan_template(&mut self, id: Uuid) -> Result<Option<PlanTemplate>, StoreError> {
        Ok(self.working.plan_templates.get(&id).cloned())
    }

    async fn latest_plan_visit_before(
        &mut self,
        plan_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .working
            .appointments
            .values()
            .filter(|a| a.customer_plan_id == Some(plan_id))
            .filter(|a| a.status != AppointmentStatus::Cancelled && a.start_at < before)
            .max_by_key(|a| a.start_at)
            .cloned())
    }

    async fn set_plan_status(&mut self, plan_id: Uuid, status: PlanStatus) -> Result<(), StoreError> {
        self.plan_mut(plan_id)?.status = status;
        Ok(())
    }

    async fn set_plan_visits_used(&mut self, plan_id: Uuid, visits_used: i32) -> Result<(), StoreError> {
        self.plan_mut(plan_id)?.visits_used_in_cycle = visits_used;
        Ok(())
    }

    async fn active_commission_rule(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<Option<ProviderCommission>, StoreError> {
        Ok(self
            .working
            .commissions
            .iter()
            .filter(|r| r.is_active && r.tenant_id == tenant_id && r.provider_id == provider_id)
            .filter(|r| r.service_id == service_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn deactivate_commission_rules(
        &mut self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<u64, StoreError> {
        let mut changed = 0;
        for rule in self.working.commissions.iter_mut() {
            if rule.is_active
                && rule.tenant_id == tenant_id
                && rule.provider_id == provider_id
                && rule.service_id == service_id
            {
                rule.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_commission_rule(&mut self, rule: &ProviderCommission) -> Result<(), StoreError> {
        self.working.commissions.push(rule.clone());
        Ok(())
    }

    async fn earning_for(&mut self, appointment_id: Uuid) -> Result<Option<AppointmentEarning>, StoreError> {
        Ok(self.working.earnings.get(&appointment_id).cloned())
    }

    async fn insert_earning(&mut self, earning: &AppointmentEarning) -> Result<(), StoreError> {
        self.working.earnings.insert(earning.appointment_id, earning.clone());
        Ok(())
    }

    async fn delete_earning(&mut self, appointment_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.working.earnings.remove(&appointment_id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ReminderRepository for MemoryStore {
    async fn reminder_settings(&self) -> Result<Vec<TenantReminderSettings>, StoreError> {
        let state = self.state.lock().await;
        let mut settings: Vec<TenantReminderSettings> =
            state.reminder_settings.values().filter(|s| s.enabled).copied().collect();
        settings.sort_by_key(|s| s.tenant_id);
        Ok(settings)
    }

    async fn reminder_candidates(
        &self,
        tenant_id: TenantId,
        from_exclusive: DateTime<Utc>,
        to_inclusive: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let state = self.state.lock().await;
        let mut candidates: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.status == AppointmentStatus::Scheduled)
            .filter(|a| a.reminder_sent_at.is_none())
            .filter(|a| a.start_at > from_exclusive && a.start_at <= to_inclusive)
            .cloned()
            .collect();
        candidates.sort_by_key(|a| a.start_at);
        Ok(candidates)
    }

    async fn claim_reminder(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.appointments.get_mut(&appointment_id) {
            Some(appointment) if appointment.reminder_sent_at.is_none() => {
                appointment.reminder_sent_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_reminder(&self, appointment_id: Uuid) -> Result<(), StoreError> {
        if let Some(appointment) = self.state.lock().await.appointments.get_mut(&appointment_id) {
            appointment.reminder_sent_at = None;
        }
        Ok(())
    }

    async fn mark_no_shows(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for appointment in state.appointments.values_mut() {
            if appointment.status == AppointmentStatus::Scheduled && appointment.start_at < before {
                appointment.status = AppointmentStatus::NoShow;
                appointment.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled_at(tenant_id: TenantId, start_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            tenant_id,
            provider_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            service_name: "Cut".to_string(),
            service_duration_minutes: 30,
            service_price_cents: 4000,
            customer_id: None,
            client_name: "Ana".to_string(),
            client_phone: "+5511988887777".to_string(),
            start_at,
            end_at: start_at + chrono::Duration::minutes(30),
            status: AppointmentStatus::Scheduled,
            customer_plan_id: None,
            reminder_sent_at: None,
            created_at: start_at,
            updated_at: start_at,
        }
    }

    #[test]
    fn reminder_claim_is_won_once_until_released() {
        let store = MemoryStore::new();
        let appointment = scheduled_at(TenantId::new(), Utc::now());
        let id = appointment.id;

        tokio_test::block_on(async {
            store.seed_appointment(appointment).await;
            let now = Utc::now();
            assert!(store.claim_reminder(id, now).await.unwrap());
            assert!(!store.claim_reminder(id, now).await.unwrap());
            store.release_reminder(id).await.unwrap();
            assert!(store.claim_reminder(id, now).await.unwrap());
            assert!(!store.claim_reminder(Uuid::new_v4(), now).await.unwrap());
        });
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let appointment = scheduled_at(TenantId::new(), Utc::now());
        let id = appointment.id;

        let mut tx = store.begin().await.unwrap();
        tx.insert_appointment(&appointment).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.appointment(id).await.is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_appointment(&appointment).await.unwrap();
        tx.commit().await.unwrap();
        assert!(store.appointment(id).await.is_some());
    }
}
