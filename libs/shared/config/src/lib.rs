use std::env;
use std::str::FromStr;
use tracing::warn;

/// When the earnings split for an appointment is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionTiming {
    /// Resolve when the appointment is marked done, using the rules in effect then.
    OnCompletion,
    /// Resolve when the appointment is created, using the rules in effect then.
    OnCreation,
}

impl FromStr for CommissionTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_completion" | "completion" => Ok(CommissionTiming::OnCompletion),
            "on_creation" | "creation" => Ok(CommissionTiming::OnCreation),
            other => Err(format!("unknown commission timing: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub port: u16,
    pub default_commission_percent: i32,
    pub commission_timing: CommissionTiming,
    pub business_utc_offset_minutes: i32,
    pub scheduler_enabled: bool,
    pub reminder_sweep_interval_secs: u64,
    pub reminder_window_minutes: i64,
    pub no_show_sweep_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            port: 3000,
            default_commission_percent: 50,
            commission_timing: CommissionTiming::OnCompletion,
            business_utc_offset_minutes: 0,
            scheduler_enabled: true,
            reminder_sweep_interval_secs: 60,
            reminder_window_minutes: 5,
            no_show_sweep_interval_secs: 86_400,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(url),
            _ => {
                warn!("DATABASE_URL not set, falling back to the in-memory store");
                None
            }
        };

        let config = Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections),
            port: parse_or("PORT", defaults.port),
            default_commission_percent: parse_or("DEFAULT_COMMISSION_PERCENT", defaults.default_commission_percent),
            commission_timing: parse_or("COMMISSION_TIMING", defaults.commission_timing),
            business_utc_offset_minutes: parse_or("BUSINESS_UTC_OFFSET_MINUTES", defaults.business_utc_offset_minutes),
            scheduler_enabled: parse_or("SCHEDULER_ENABLED", defaults.scheduler_enabled),
            reminder_sweep_interval_secs: parse_or("REMINDER_SWEEP_INTERVAL_SECS", defaults.reminder_sweep_interval_secs),
            reminder_window_minutes: parse_or("REMINDER_WINDOW_MINUTES", defaults.reminder_window_minutes),
            no_show_sweep_interval_secs: parse_or("NO_SHOW_SWEEP_INTERVAL_SECS", defaults.no_show_sweep_interval_secs),
        };

        if !(0..=100).contains(&config.default_commission_percent) {
            warn!(
                "DEFAULT_COMMISSION_PERCENT={} is outside 0..=100, using 50",
                config.default_commission_percent
            );
            return Self { default_commission_percent: 50, ..config };
        }

        config
    }

    pub fn uses_database(&self) -> bool {
        self.database_url.is_some()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
