use shared_config::{AppConfig, CommissionTiming};

/// Builder for the configuration used by cell tests; never reads the environment.
pub struct TestConfig {
    pub default_commission_percent: i32,
    pub commission_timing: CommissionTiming,
    pub business_utc_offset_minutes: i32,
    pub reminder_window_minutes: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            default_commission_percent: 50,
            commission_timing: CommissionTiming::OnCompletion,
            business_utc_offset_minutes: 0,
            reminder_window_minutes: 5,
        }
    }
}

impl TestConfig {
    pub fn with_commission_percent(mut self, percent: i32) -> Self {
        self.default_commission_percent = percent;
        self
    }

    pub fn with_timing(mut self, timing: CommissionTiming) -> Self {
        self.commission_timing = timing;
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.business_utc_offset_minutes = minutes;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_url: None,
            default_commission_percent: self.default_commission_percent,
            commission_timing: self.commission_timing,
            business_utc_offset_minutes: self.business_utc_offset_minutes,
            scheduler_enabled: false,
            reminder_window_minutes: self.reminder_window_minutes,
            ..AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default()
            .with_commission_percent(40)
            .with_timing(CommissionTiming::OnCreation)
            .to_app_config();

        assert_eq!(config.default_commission_percent, 40);
        assert_eq!(config.commission_timing, CommissionTiming::OnCreation);
        assert!(!config.scheduler_enabled);
        assert!(config.database_url.is_none());
    }
}
