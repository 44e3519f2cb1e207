#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use booking_cell::models::{
    CreateAppointmentRequest, CustomerPlan, Location, PlanStatus, PlanTemplate, Provider, Service,
    WeeklyHours,
};
use booking_cell::services::lifecycle::AppointmentLifecycleManager;
use booking_cell::store::{BookingStore, MemoryStore};
use shared_config::AppConfig;
use shared_models::tenant::TenantId;
use shared_utils::test_utils::TestConfig;

pub fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}

/// Friday before the test week.
pub fn now() -> DateTime<Utc> {
    at("2025-05-30T12:00:00Z")
}

pub fn weekday_hours() -> WeeklyHours {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .fold(WeeklyHours::default(), |hours, day| {
            hours.with_day(day, &[("09:00", "12:00"), ("14:00", "18:00")])
        })
}

pub struct Fixture {
    pub store: MemoryStore,
    pub tenant: TenantId,
    pub location_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub config: AppConfig,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(config: TestConfig) -> Self {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let location_id = Uuid::new_v4();
        let provider_id = Uuid::new_v4();
        let service_id = Uuid::new_v4();

        store
            .seed_location(Location {
                id: location_id,
                tenant_id: tenant,
                name: "Downtown".to_string(),
                working_hours: None,
            })
            .await;
        store
            .seed_provider(Provider {
                id: provider_id,
                tenant_id: tenant,
                location_id,
                name: "Ana".to_string(),
                working_hours: Some(weekday_hours()),
                is_active: true,
            })
            .await;
        store
            .seed_service(Service {
                id: service_id,
                tenant_id: tenant,
                location_id: Some(location_id),
                name: "Haircut".to_string(),
                duration_minutes: 30,
                price_cents: 4000,
                is_active: true,
            })
            .await;

        Self {
            store,
            tenant,
            location_id,
            provider_id,
            service_id,
            config: config.to_app_config(),
        }
    }

    pub fn store_handle(&self) -> Arc<dyn BookingStore> {
        Arc::new(self.store.clone())
    }

    pub fn manager(&self) -> AppointmentLifecycleManager {
        AppointmentLifecycleManager::new(self.store_handle(), &self.config)
    }

    pub async fn add_service(&self, name: &str, duration_minutes: i32, price_cents: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .seed_service(Service {
                id,
                tenant_id: self.tenant,
                location_id: None,
                name: name.to_string(),
                duration_minutes,
                price_cents,
                is_active: true,
            })
            .await;
        id
    }

    pub fn plan_template(&self) -> PlanTemplate {
        PlanTemplate {
            id: Uuid::new_v4(),
            tenant_id: self.tenant,
            location_id: None,
            name: "Monthly Care".to_string(),
            interval_days: 30,
            visits_per_interval: 2,
            combo_service_ids: vec![],
            eligible_service_ids: vec![],
            allowed_weekdays: vec![],
            min_advance_days: None,
            min_days_between_visits: None,
            allowed_start_minutes: None,
            allowed_end_minutes: None,
        }
    }

    /// Seeds a plan for a June 2025 cycle and returns its id.
    pub async fn add_plan(&self, template: PlanTemplate) -> Uuid {
        let plan_id = Uuid::new_v4();
        let template_id = template.id;
        self.store.seed_plan_template(template).await;
        self.store
            .seed_customer_plan(CustomerPlan {
                id: plan_id,
                tenant_id: self.tenant,
                customer_id: Uuid::new_v4(),
                template_id,
                status: PlanStatus::Active,
                current_cycle_start: at("2025-06-01T00:00:00Z"),
                current_cycle_end: at("2025-06-30T00:00:00Z"),
                visits_used_in_cycle: 0,
                carry_over_visits: 0,
                last_payment_status: Some("paid".to_string()),
            })
            .await;
        plan_id
    }

    pub fn request(&self, start: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            provider_id: self.provider_id,
            service_id: self.service_id,
            start_at: at(start),
            end_at: None,
            client_name: "Maria Silva".to_string(),
            client_phone: "+55 (11) 98888-7777".to_string(),
            customer_plan_id: None,
        }
    }

    pub fn plan_request(&self, start: &str, plan_id: Uuid) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            customer_plan_id: Some(plan_id),
            ..self.request(start)
        }
    }
}
