mod common;

use futures::future::join_all;

use booking_cell::BookingError;

use common::{now, Fixture};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_of_one_slot_admit_exactly_one() {
    let fx = Fixture::new().await;
    let manager = fx.manager();

    let attempts = (0..8).map(|i| {
        let manager = manager.clone();
        let tenant = fx.tenant;
        let mut request = fx.request("2025-06-02T10:00:00Z");
        request.client_name = format!("Client {}", i);
        request.client_phone = format!("+551199999000{}", i);
        tokio::spawn(async move { manager.create_appointment_at(tenant, request, now()).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("booking task panicked"))
        .collect();

    let booked = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::AppointmentConflict { .. })))
        .count();

    assert_eq!(booked, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_plan_bookings_never_exceed_the_quota() {
    let fx = Fixture::new().await;
    let manager = fx.manager();
    let plan_id = fx.add_plan(fx.plan_template()).await;

    let starts = [
        "2025-06-02T09:00:00Z",
        "2025-06-03T09:00:00Z",
        "2025-06-04T09:00:00Z",
        "2025-06-05T09:00:00Z",
        "2025-06-06T09:00:00Z",
    ];
    let attempts = starts.iter().map(|start| {
        let manager = manager.clone();
        let tenant = fx.tenant;
        let request = fx.plan_request(start, plan_id);
        tokio::spawn(async move { manager.create_appointment_at(tenant, request, now()).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("booking task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    assert_eq!(fx.store.customer_plan(plan_id).await.unwrap().visits_used_in_cycle, 2);
}
