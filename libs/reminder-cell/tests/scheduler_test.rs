use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use booking_cell::models::{Appointment, AppointmentStatus, TenantReminderSettings};
use booking_cell::store::MemoryStore;
use reminder_cell::{ReminderError, ReminderMessage, ReminderScheduler, ReminderSender};
use shared_models::tenant::TenantId;
use shared_utils::test_utils::TestConfig;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}

/// Records deliveries; fails for phones listed in `failing`.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<Uuid>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<Uuid> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderSender for RecordingSender {
    async fn send(&self, message: &ReminderMessage) -> Result<(), ReminderError> {
        if self.failing.lock().unwrap().contains(&message.phone) {
            return Err(ReminderError::Delivery("gateway unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.appointment_id);
        Ok(())
    }
}

struct Setup {
    store: MemoryStore,
    sender: Arc<RecordingSender>,
    tenant: TenantId,
}

impl Setup {
    async fn new(config: TestConfig) -> (Self, ReminderScheduler) {
        let store = MemoryStore::new();
        let sender = Arc::new(RecordingSender::default());
        let tenant = TenantId::new();
        store
            .seed_reminder_settings(TenantReminderSettings {
                tenant_id: tenant,
                enabled: true,
                hours_before: 24,
            })
            .await;

        let scheduler = ReminderScheduler::new(
            Arc::new(store.clone()),
            sender.clone(),
            &config.to_app_config(),
        );
        (Self { store, sender, tenant }, scheduler)
    }

    async fn appointment(&self, start: DateTime<Utc>, phone: &str, status: AppointmentStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .seed_appointment(Appointment {
                id,
                tenant_id: self.tenant,
                provider_id: Uuid::new_v4(),
                location_id: Uuid::new_v4(),
                service_id: Uuid::new_v4(),
                service_name: "Haircut".to_string(),
                service_duration_minutes: 30,
                service_price_cents: 4000,
                customer_id: None,
                client_name: "Maria Silva".to_string(),
                client_phone: phone.to_string(),
                start_at: start,
                end_at: start + Duration::minutes(30),
                status,
                customer_plan_id: None,
                reminder_sent_at: None,
                created_at: start - Duration::days(7),
                updated_at: start - Duration::days(7),
            })
            .await;
        id
    }
}

#[tokio::test]
async fn reminder_goes_out_once_when_the_window_reaches_the_start() {
    let (setup, scheduler) = Setup::new(TestConfig::default()).await;
    let now = at("2025-06-02T10:00:00Z");
    let id = setup
        .appointment(now + Duration::hours(24) + Duration::minutes(2), "+5511988887777", AppointmentStatus::Scheduled)
        .await;

    let report = scheduler.run_reminder_sweep(now).await.unwrap();
    assert_eq!(report.candidates, 0);
    assert!(setup.sender.sent().is_empty());

    let later = now + Duration::minutes(2);
    let report = scheduler.run_reminder_sweep(later).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(setup.sender.sent(), vec![id]);
    assert_eq!(setup.store.appointment(id).await.unwrap().reminder_sent_at, Some(later));

    let report = scheduler.run_reminder_sweep(later + Duration::minutes(1)).await.unwrap();
    assert_eq!(report.candidates, 0);
    assert_eq!(setup.sender.sent().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sweeps_send_each_reminder_once() {
    let (setup, scheduler) = Setup::new(TestConfig::default()).await;
    let now = at("2025-06-02T10:00:00Z");
    let mut ids = Vec::new();
    for minutes in 0..4 {
        let start = now + Duration::hours(24) - Duration::minutes(minutes);
        ids.push(setup.appointment(start, "+5511988887777", AppointmentStatus::Scheduled).await);
    }

    let sweeps = (0..4).map(|_| {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run_reminder_sweep(now).await })
    });
    let reports: Vec<_> = futures::future::join_all(sweeps)
        .await
        .into_iter()
        .map(|joined| joined.expect("sweep task panicked").unwrap())
        .collect();

    assert_eq!(reports.iter().map(|r| r.sent).sum::<usize>(), 4);
    let mut sent = setup.sender.sent();
    sent.sort();
    ids.sort();
    assert_eq!(sent, ids);
}

#[tokio::test]
async fn invalid_phone_releases_the_claim() {
    let (setup, scheduler) = Setup::new(TestConfig::default()).await;
    let now = at("2025-06-02T10:00:00Z");
    let id = setup
        .appointment(now + Duration::hours(24), "11 98888-7777", AppointmentStatus::Scheduled)
        .await;

    let report = scheduler.run_reminder_sweep(now).await.unwrap();
    assert_eq!(report.invalid_phone, 1);
    assert!(setup.sender.sent().is_empty());
    assert_eq!(setup.store.appointment(id).await.unwrap().reminder_sent_at, None);
}

#[tokio::test]
async fn failed_delivery_is_retried_by_the_next_sweep() {
    let (setup, scheduler) = Setup::new(TestConfig::default()).await;
    let now = at("2025-06-02T10:00:00Z");
    let phone = "+5511977776666";
    let failing = setup.appointment(now + Duration::hours(24), phone, AppointmentStatus::Scheduled).await;
    let healthy = setup
        .appointment(now + Duration::hours(24) - Duration::minutes(1), "+5511988887777", AppointmentStatus::Scheduled)
        .await;
    setup.sender.failing.lock().unwrap().push(phone.to_string());

    let report = scheduler.run_reminder_sweep(now).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(setup.sender.sent(), vec![healthy]);
    assert_eq!(setup.store.appointment(failing).await.unwrap().reminder_sent_at, None);

    setup.sender.failing.lock().unwrap().clear();
    let report = scheduler.run_reminder_sweep(now).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(setup.sender.sent(), vec![healthy, failing]);
}

#[tokio::test]
async fn only_scheduled_appointments_of_enabled_tenants_are_reminded() {
    let (setup, scheduler) = Setup::new(TestConfig::default()).await;
    let now = at("2025-06-02T10:00:00Z");
    setup
        .appointment(now + Duration::hours(24), "+5511988887777", AppointmentStatus::Cancelled)
        .await;

    let other = TenantId::new();
    setup
        .store
        .seed_reminder_settings(TenantReminderSettings {
            tenant_id: other,
            enabled: false,
            hours_before: 24,
        })
        .await;

    let report = scheduler.run_reminder_sweep(now).await.unwrap();
    assert_eq!(report.tenants, 1);
    assert_eq!(report.candidates, 0);
}

#[tokio::test]
async fn no_show_sweep_uses_the_local_midnight() {
    // UTC-3: 02:00Z on June 2nd is 23:00 on June 1st locally.
    let (setup, scheduler) = Setup::new(TestConfig::default().with_utc_offset(-180)).await;
    let now = at("2025-06-02T02:00:00Z");

    let yesterday = setup
        .appointment(at("2025-06-01T02:00:00Z"), "+5511988887777", AppointmentStatus::Scheduled)
        .await;
    let today = setup
        .appointment(at("2025-06-01T04:00:00Z"), "+5511988887777", AppointmentStatus::Scheduled)
        .await;
    let done = setup
        .appointment(at("2025-05-30T15:00:00Z"), "+5511988887777", AppointmentStatus::Done)
        .await;

    let report = scheduler.run_no_show_sweep(now).await.unwrap();
    assert_eq!(report.cutoff, at("2025-06-01T03:00:00Z"));
    assert_eq!(report.marked, 1);

    assert_matches!(
        setup.store.appointment(yesterday).await.unwrap().status,
        AppointmentStatus::NoShow
    );
    assert_matches!(
        setup.store.appointment(today).await.unwrap().status,
        AppointmentStatus::Scheduled
    );
    assert_matches!(setup.store.appointment(done).await.unwrap().status, AppointmentStatus::Done);
}
