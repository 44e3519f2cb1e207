// libs/booking-cell/src/services/unit_of_work.rs
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::BookingError;
use crate::store::{BookingStore, BookingTx};

/// Runs `work` inside one store transaction.
///
/// Commits when `work` succeeds and rolls back when it fails, except for
/// errors that report [`BookingError::persists_side_effects`]: those are
/// committed first and then returned to the caller.
pub async fn unit_of_work<T, F>(store: &dyn BookingStore, work: F) -> Result<T, BookingError>
where
    T: Send,
    F: for<'t> FnOnce(&'t mut Box<dyn BookingTx>) -> BoxFuture<'t, Result<T, BookingError>> + Send,
{
    let mut tx = store.begin().await?;

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) if err.persists_side_effects() => {
            debug!("Committing side effects of rejected operation: {}", err);
            tx.commit().await?;
            Err(err)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed after {}: {}", err, rollback_err);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStatus, Service};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use shared_models::tenant::TenantId;
    use uuid::Uuid;

    fn service(tenant_id: TenantId) -> Service {
        Service {
            id: Uuid::new_v4(),
            tenant_id,
            location_id: None,
            name: "Cut".to_string(),
            duration_minutes: 30,
            price_cents: 4000,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn failed_work_is_rolled_back() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let plan_id = Uuid::new_v4();
        store
            .seed_customer_plan(crate::models::CustomerPlan {
                id: plan_id,
                tenant_id: tenant,
                customer_id: Uuid::new_v4(),
                template_id: Uuid::new_v4(),
                status: PlanStatus::Active,
                current_cycle_start: chrono::Utc::now(),
                current_cycle_end: chrono::Utc::now(),
                visits_used_in_cycle: 0,
                carry_over_visits: 0,
                last_payment_status: None,
            })
            .await;

        let result: Result<(), BookingError> = unit_of_work(&store, move |tx| {
            Box::pin(async move {
                tx.set_plan_visits_used(plan_id, 1).await?;
                Err(BookingError::ServiceNotInPlan)
            })
        })
        .await;

        assert_matches!(result, Err(BookingError::ServiceNotInPlan));
        assert_eq!(store.customer_plan(plan_id).await.unwrap().visits_used_in_cycle, 0);

        let result: Result<(), BookingError> = unit_of_work(&store, move |tx| {
            Box::pin(async move {
                tx.set_plan_status(plan_id, PlanStatus::Late).await?;
                Err(BookingError::PlanCycleExpired {
                    cycle_end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                })
            })
        })
        .await;

        assert_matches!(result, Err(BookingError::PlanCycleExpired { .. }));
        assert_eq!(store.customer_plan(plan_id).await.unwrap().status, PlanStatus::Late);
    }

    #[tokio::test]
    async fn successful_work_is_committed() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let svc = service(tenant);
        store.seed_service(svc.clone()).await;

        let found = unit_of_work(&store, move |tx| {
            Box::pin(async move { Ok(tx.service(svc.id).await?.map(|s| s.name)) })
        })
        .await
        .unwrap();

        assert_eq!(found.as_deref(), Some("Cut"));
    }
}
