use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use booking_cell::store::ReminderRepository;
use booking_cell::time::BusinessClock;

use crate::error::ReminderError;
use crate::models::NoShowReport;

/// Moves every appointment still `scheduled` that started before today's
/// local midnight to `no_show`. No earnings or plan visits are touched.
#[instrument(skip(repo))]
pub async fn sweep_no_shows(
    repo: &dyn ReminderRepository,
    clock: BusinessClock,
    now: DateTime<Utc>,
) -> Result<NoShowReport, ReminderError> {
    let cutoff = clock.local_midnight(now);
    let marked = repo.mark_no_shows(cutoff).await?;

    if marked > 0 {
        info!("Marked {} appointments as no-show (cutoff {})", marked, cutoff);
    }

    Ok(NoShowReport { cutoff, marked })
}
