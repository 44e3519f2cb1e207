use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use booking_cell::store::ReminderRepository;
use booking_cell::time::BusinessClock;
use shared_config::AppConfig;

use crate::error::ReminderError;
use crate::models::{NoShowReport, ReminderReport};
use crate::services::no_show::sweep_no_shows;
use crate::services::reminder::sweep_reminders;
use crate::services::sender::ReminderSender;

/// Periodic no-show and reminder sweeps. Safe to run on several instances at
/// once: no-show marking is a single bulk update and reminders are claimed
/// with a compare-and-swap before sending.
#[derive(Clone)]
pub struct ReminderScheduler {
    repo: Arc<dyn ReminderRepository>,
    sender: Arc<dyn ReminderSender>,
    clock: BusinessClock,
    window_minutes: i64,
    reminder_every: Duration,
    no_show_every: Duration,
}

impl ReminderScheduler {
    pub fn new(
        repo: Arc<dyn ReminderRepository>,
        sender: Arc<dyn ReminderSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            repo,
            sender,
            clock: BusinessClock::from_offset_minutes(config.business_utc_offset_minutes),
            window_minutes: config.reminder_window_minutes.max(1),
            reminder_every: Duration::from_secs(config.reminder_sweep_interval_secs.max(1)),
            no_show_every: Duration::from_secs(config.no_show_sweep_interval_secs.max(1)),
        }
    }

    pub async fn run_no_show_sweep(&self, now: DateTime<Utc>) -> Result<NoShowReport, ReminderError> {
        sweep_no_shows(self.repo.as_ref(), self.clock, now).await
    }

    pub async fn run_reminder_sweep(&self, now: DateTime<Utc>) -> Result<ReminderReport, ReminderError> {
        sweep_reminders(self.repo.as_ref(), self.sender.as_ref(), self.window_minutes, now).await
    }

    /// Starts both sweep loops on the current runtime. The first tick of each
    /// fires immediately.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        info!(
            "Starting scheduler: reminders every {:?}, no-shows every {:?}",
            self.reminder_every, self.no_show_every
        );

        let reminders = self.clone();
        let reminder_loop = tokio::spawn(async move {
            let mut ticker = interval(reminders.reminder_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = reminders.run_reminder_sweep(Utc::now()).await {
                    error!("Reminder sweep failed: {}", e);
                }
            }
        });

        let no_shows = self.clone();
        let no_show_loop = tokio::spawn(async move {
            let mut ticker = interval(no_shows.no_show_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = no_shows.run_no_show_sweep(Utc::now()).await {
                    error!("No-show sweep failed: {}", e);
                }
            }
        });

        vec![reminder_loop, no_show_loop]
    }
}
