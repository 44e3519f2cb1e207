use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, instrument, warn};

use booking_cell::models::{Appointment, TenantReminderSettings};
use booking_cell::store::ReminderRepository;
use shared_utils::phone::is_e164;

use crate::error::ReminderError;
use crate::models::{ReminderMessage, ReminderReport};
use crate::services::sender::ReminderSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    AlreadyClaimed,
}

/// `(now + hours_before - window, now + hours_before]`. Consecutive sweeps one
/// window apart cover every start instant exactly once.
pub fn reminder_window(
    now: DateTime<Utc>,
    hours_before: i32,
    window_minutes: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let to = now + Duration::hours(hours_before as i64);
    (to - Duration::minutes(window_minutes), to)
}

/// Sends at most one reminder per appointment across any number of
/// concurrent sweeps. A tenant or appointment that fails is logged and
/// skipped; only failing to read the tenant list aborts the sweep.
#[instrument(skip(repo, sender))]
pub async fn sweep_reminders(
    repo: &dyn ReminderRepository,
    sender: &dyn ReminderSender,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> Result<ReminderReport, ReminderError> {
    let mut report = ReminderReport::default();

    for settings in repo.reminder_settings().await? {
        report.tenants += 1;
        if let Err(e) = sweep_tenant(repo, sender, settings, window_minutes, now, &mut report).await {
            error!(tenant_id = %settings.tenant_id, "Reminder sweep failed for tenant: {}", e);
        }
    }

    if report.sent > 0 || report.failed > 0 || report.invalid_phone > 0 {
        info!(
            "Reminder sweep: {} sent, {} invalid phone, {} failed, {} already claimed",
            report.sent, report.invalid_phone, report.failed, report.already_claimed
        );
    }

    Ok(report)
}

async fn sweep_tenant(
    repo: &dyn ReminderRepository,
    sender: &dyn ReminderSender,
    settings: TenantReminderSettings,
    window_minutes: i64,
    now: DateTime<Utc>,
    report: &mut ReminderReport,
) -> Result<(), ReminderError> {
    let (from, to) = reminder_window(now, settings.hours_before, window_minutes);
    let candidates = repo.reminder_candidates(settings.tenant_id, from, to).await?;
    debug!(
        tenant_id = %settings.tenant_id,
        "{} reminder candidates between {} and {}",
        candidates.len(),
        from,
        to
    );

    for appointment in candidates {
        report.candidates += 1;
        match deliver(repo, sender, &appointment, now).await {
            Ok(Delivery::Sent) => report.sent += 1,
            Ok(Delivery::AlreadyClaimed) => report.already_claimed += 1,
            Err(ReminderError::InvalidPhone(phone)) => {
                warn!(appointment_id = %appointment.id, "Skipping reminder, phone {} is not E.164", phone);
                report.invalid_phone += 1;
            }
            Err(e) => {
                error!(appointment_id = %appointment.id, "Reminder not delivered: {}", e);
                report.failed += 1;
            }
        }
    }

    Ok(())
}

/// Claim, validate, send. The claim is released whenever the reminder does
/// not go out so a later sweep can retry it.
async fn deliver(
    repo: &dyn ReminderRepository,
    sender: &dyn ReminderSender,
    appointment: &Appointment,
    now: DateTime<Utc>,
) -> Result<Delivery, ReminderError> {
    if !repo.claim_reminder(appointment.id, now).await? {
        return Ok(Delivery::AlreadyClaimed);
    }

    if !is_e164(&appointment.client_phone) {
        repo.release_reminder(appointment.id).await?;
        return Err(ReminderError::InvalidPhone(appointment.client_phone.clone()));
    }

    if let Err(e) = sender.send(&ReminderMessage::from(appointment)).await {
        repo.release_reminder(appointment.id).await?;
        return Err(e);
    }

    Ok(Delivery::Sent)
}
