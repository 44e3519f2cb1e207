mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use booking_cell::models::{Block, FreeInterval, Location, Provider, WeeklyHours};
use booking_cell::services::availability::AvailabilityService;
use booking_cell::BookingError;
use shared_models::tenant::TenantId;

use common::{at, now, Fixture};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn interval(start: &str, end: &str) -> FreeInterval {
    FreeInterval {
        start: start.to_string(),
        end: end.to_string(),
    }
}

async fn morning_provider(fx: &Fixture) -> Uuid {
    let id = Uuid::new_v4();
    let hours: WeeklyHours = serde_json::from_str(r#"{"mon": [["09:00", "12:00"]]}"#).unwrap();
    fx.store
        .seed_provider(Provider {
            id,
            tenant_id: fx.tenant,
            location_id: fx.location_id,
            name: "Morning only".to_string(),
            working_hours: Some(hours),
            is_active: true,
        })
        .await;
    id
}

#[tokio::test]
async fn empty_morning_yields_half_hour_slots_up_to_closing() {
    let fx = Fixture::new().await;
    let provider_id = morning_provider(&fx).await;
    let availability = AvailabilityService::new(fx.store_handle());

    let slots = availability
        .bookable_slots(fx.tenant, provider_id, fx.service_id, monday(), Some(30))
        .await
        .unwrap();

    let starts: Vec<_> = slots.iter().map(|s| s.start_at).collect();
    assert_eq!(
        starts,
        vec![
            at("2025-06-02T09:00:00Z"),
            at("2025-06-02T09:30:00Z"),
            at("2025-06-02T10:00:00Z"),
            at("2025-06-02T10:30:00Z"),
            at("2025-06-02T11:00:00Z"),
            at("2025-06-02T11:30:00Z"),
        ]
    );
    assert_eq!(slots.last().unwrap().end_at, at("2025-06-02T12:00:00Z"));
}

#[tokio::test]
async fn blocks_and_live_appointments_are_carved_out() {
    let fx = Fixture::new().await;
    let provider_id = morning_provider(&fx).await;
    let manager = fx.manager();
    let availability = AvailabilityService::new(fx.store_handle());

    let mut request = fx.request("2025-06-02T10:00:00Z");
    request.provider_id = provider_id;
    manager.create_appointment_at(fx.tenant, request, now()).await.unwrap();

    let mut cancelled = fx.request("2025-06-02T09:00:00Z");
    cancelled.provider_id = provider_id;
    let cancelled = manager.create_appointment_at(fx.tenant, cancelled, now()).await.unwrap();
    manager.cancel_appointment_at(fx.tenant, cancelled.id, now()).await.unwrap();

    fx.store
        .seed_block(Block {
            id: Uuid::new_v4(),
            tenant_id: fx.tenant,
            provider_id,
            start_at: at("2025-06-02T11:00:00Z"),
            end_at: at("2025-06-02T11:30:00Z"),
            reason: None,
        })
        .await;

    let free = availability.day_availability(fx.tenant, provider_id, monday()).await.unwrap();
    assert_eq!(
        free,
        vec![
            interval("09:00", "10:00"),
            interval("10:30", "11:00"),
            interval("11:30", "12:00"),
        ]
    );

    let slots = availability
        .bookable_slots(fx.tenant, provider_id, fx.service_id, monday(), Some(15))
        .await
        .unwrap();
    for slot in &slots {
        assert!(slot.start_at < at("2025-06-02T10:00:00Z") || slot.start_at >= at("2025-06-02T10:30:00Z"));
        assert!(slot.end_at <= at("2025-06-02T11:00:00Z") || slot.start_at >= at("2025-06-02T11:30:00Z"));
    }
}

#[tokio::test]
async fn provider_without_template_falls_back_to_location() {
    let fx = Fixture::new().await;
    let location_id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();
    fx.store
        .seed_location(Location {
            id: location_id,
            tenant_id: fx.tenant,
            name: "Mall".to_string(),
            working_hours: Some(WeeklyHours::default().with_day("mon", &[("13:00", "15:00")])),
        })
        .await;
    fx.store
        .seed_provider(Provider {
            id: provider_id,
            tenant_id: fx.tenant,
            location_id,
            name: "Floater".to_string(),
            working_hours: None,
            is_active: true,
        })
        .await;

    let availability = AvailabilityService::new(fx.store_handle());
    let free = availability.day_availability(fx.tenant, provider_id, monday()).await.unwrap();
    assert_eq!(free, vec![interval("13:00", "15:00")]);

    // Fixture location has no template: nothing is open.
    let mut orphan = Provider {
        id: Uuid::new_v4(),
        tenant_id: fx.tenant,
        location_id: fx.location_id,
        name: "No hours".to_string(),
        working_hours: None,
        is_active: true,
    };
    fx.store.seed_provider(orphan.clone()).await;
    assert!(availability.day_availability(fx.tenant, orphan.id, monday()).await.unwrap().is_empty());

    orphan.working_hours = Some(WeeklyHours::default().with_day("mon", &[("09:00", "10:00")]));
    orphan.is_active = false;
    fx.store.seed_provider(orphan.clone()).await;
    assert!(availability.day_availability(fx.tenant, orphan.id, monday()).await.unwrap().is_empty());
}

#[tokio::test]
async fn other_tenants_cannot_read_availability() {
    let fx = Fixture::new().await;
    let availability = AvailabilityService::new(fx.store_handle());

    assert_matches!(
        availability.day_availability(TenantId::new(), fx.provider_id, monday()).await,
        Err(BookingError::Forbidden(_))
    );
    assert_matches!(
        availability
            .bookable_slots(fx.tenant, fx.provider_id, Uuid::new_v4(), monday(), None)
            .await,
        Err(BookingError::ServiceNotFound)
    );
    assert_matches!(
        availability
            .bookable_slots(fx.tenant, fx.provider_id, fx.service_id, monday(), Some(0))
            .await,
        Err(BookingError::Validation(_))
    );
}
