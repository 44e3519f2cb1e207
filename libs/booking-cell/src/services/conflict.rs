// libs/booking-cell/src/services/conflict.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::error::BookingError;
use crate::store::BookingTx;

/// Half-open overlap; windows that only touch do not conflict.
pub fn windows_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Rejects `[start, end)` when it overlaps a block or a non-cancelled
/// appointment of the provider. Must be called after the final duration is
/// known, inside the transaction that performs the write.
pub async fn ensure_window_free(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    provider_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_appointment_id: Option<Uuid>,
) -> Result<(), BookingError> {
    debug!("Checking conflicts for provider {} from {} to {}", provider_id, start, end);

    let blocks = tx.blocks_overlapping(tenant_id, provider_id, start, end).await?;
    if let Some(block) = blocks
        .iter()
        .find(|b| windows_overlap(b.start_at, b.end_at, start, end))
    {
        warn!("Block conflict for provider {} ({} - {})", provider_id, block.start_at, block.end_at);
        return Err(BookingError::BlockConflict {
            start: block.start_at,
            end: block.end_at,
        });
    }

    let appointments = tx
        .appointments_overlapping(tenant_id, provider_id, start, end, exclude_appointment_id)
        .await?;
    if let Some(existing) = appointments
        .iter()
        .find(|a| windows_overlap(a.start_at, a.end_at, start, end))
    {
        warn!("Appointment conflict for provider {} with {}", provider_id, existing.id);
        return Err(BookingError::AppointmentConflict { existing_id: existing.id });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        let a = (at("2025-06-02T10:00:00Z"), at("2025-06-02T10:30:00Z"));

        assert!(windows_overlap(a.0, a.1, at("2025-06-02T10:15:00Z"), at("2025-06-02T10:45:00Z")));
        assert!(!windows_overlap(a.0, a.1, at("2025-06-02T10:30:00Z"), at("2025-06-02T11:00:00Z")));
        assert!(!windows_overlap(a.0, a.1, at("2025-06-02T09:30:00Z"), at("2025-06-02T10:00:00Z")));
    }

    #[test]
    fn overlap_is_symmetric() {
        let base = at("2025-06-02T09:00:00Z");
        let windows: Vec<(DateTime<Utc>, DateTime<Utc>)> = (0..12)
            .flat_map(|s| (1..6).map(move |len| (s * 15, len * 15)))
            .map(|(offset, len)| {
                let start = base + Duration::minutes(offset);
                (start, start + Duration::minutes(len))
            })
            .collect();

        for a in &windows {
            for b in &windows {
                assert_eq!(
                    windows_overlap(a.0, a.1, b.0, b.1),
                    windows_overlap(b.0, b.1, a.0, a.1)
                );
            }
        }
    }
}
