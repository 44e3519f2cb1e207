// libs/booking-cell/src/services/interval.rs
//! Minute-of-day range arithmetic. All ranges are half-open `[start, end)`.

use serde::{Deserialize, Serialize};

use crate::error::BookingError;

pub const MINUTES_PER_DAY: i32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinuteRange {
    pub start: i32,
    pub end: i32,
}

impl MinuteRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Removes every occupied range from the free ranges. Pieces of zero length
/// are dropped; the order of `occupied` does not matter.
pub fn subtract(free: &[MinuteRange], occupied: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut remaining: Vec<MinuteRange> = free.iter().copied().filter(|r| !r.is_empty()).collect();

    for cut in occupied.iter().filter(|r| !r.is_empty()) {
        remaining = remaining
            .into_iter()
            .flat_map(|range| {
                if !range.overlaps(cut) {
                    return vec![range];
                }
                [
                    MinuteRange::new(range.start, cut.start.min(range.end)),
                    MinuteRange::new(cut.end.max(range.start), range.end),
                ]
                .into_iter()
                .filter(|piece| !piece.is_empty())
                .collect()
            })
            .collect();
    }

    remaining.sort();
    remaining
}

/// Sorts by start and coalesces ranges that overlap or touch.
pub fn merge(ranges: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut sorted: Vec<MinuteRange> = ranges.iter().copied().filter(|r| !r.is_empty()).collect();
    sorted.sort();

    let mut merged: Vec<MinuteRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

pub fn total_minutes(ranges: &[MinuteRange]) -> i32 {
    ranges.iter().map(MinuteRange::len).sum()
}

/// Parses `"HH:MM"`; `"24:00"` is accepted as end of day.
pub fn parse_clock(value: &str) -> Result<i32, BookingError> {
    let invalid = || BookingError::InvalidWorkingHours(format!("'{}' is not a HH:MM time", value));

    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;

    if !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    let total = hours * 60 + minutes;
    if !(0..=MINUTES_PER_DAY).contains(&total) {
        return Err(invalid());
    }
    Ok(total)
}

pub fn format_clock(minute_of_day: i32) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}
