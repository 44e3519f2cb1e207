// libs/booking-cell/src/time.rs
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc};
use tracing::warn;

const WEEKDAY_KEYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Template key for a calendar date, `sun`..`sat`.
pub fn weekday_key(date: NaiveDate) -> &'static str {
    WEEKDAY_KEYS[date.weekday().num_days_from_sunday() as usize]
}

/// `[00:00, next 00:00)` of a UTC calendar date.
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

/// Fixed-offset wall clock of the business. Plan weekday and time-of-day
/// rules and the no-show midnight are evaluated on it.
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    offset: FixedOffset,
}

impl Default for BusinessClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl BusinessClock {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset_minutes(minutes: i32) -> Self {
        match FixedOffset::east_opt(minutes * 60) {
            Some(offset) => Self { offset },
            None => {
                warn!("UTC offset of {} minutes is out of range, using UTC", minutes);
                Self::utc()
            }
        }
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// 0 = Sunday .. 6 = Saturday
    pub fn weekday(&self, instant: DateTime<Utc>) -> u32 {
        self.local(instant).weekday().num_days_from_sunday()
    }

    pub fn minute_of_day(&self, instant: DateTime<Utc>) -> i32 {
        let local = self.local(instant);
        (local.hour() * 60 + local.minute()) as i32
    }

    /// Start of the local day containing `now`, as a UTC instant.
    pub fn local_midnight(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = self.local(now).date_naive();
        let naive_midnight = local_date.and_time(NaiveTime::MIN);
        (naive_midnight - Duration::seconds(self.offset.local_minus_utc() as i64)).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn weekday_keys_start_on_sunday() {
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(weekday_key(monday), "mon");
        assert_eq!(weekday_key(monday - Duration::days(1)), "sun");
    }

    #[test]
    fn negative_offset_shifts_weekday_and_minutes() {
        let clock = BusinessClock::from_offset_minutes(-180);
        // Monday 01:30 UTC is Sunday 22:30 at UTC-3
        let instant = at("2025-06-02T01:30:00Z");
        assert_eq!(clock.weekday(instant), 0);
        assert_eq!(clock.minute_of_day(instant), 22 * 60 + 30);
    }

    #[test]
    fn local_midnight_is_expressed_in_utc() {
        let clock = BusinessClock::from_offset_minutes(-180);
        assert_eq!(clock.local_midnight(at("2025-06-02T12:00:00Z")), at("2025-06-02T03:00:00Z"));
        assert_eq!(BusinessClock::utc().local_midnight(at("2025-06-02T12:00:00Z")), at("2025-06-02T00:00:00Z"));
    }
}
