// libs/booking-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_models::tenant::TenantId;

use crate::error::BookingError;
use crate::models::{BookableSlot, FreeInterval, Provider, WeeklyHours};
use crate::services::interval::{self, MinuteRange};
use crate::services::unit_of_work::unit_of_work;
use crate::store::{BookingStore, BookingTx};
use crate::time::{utc_day_bounds, weekday_key};

pub const DEFAULT_SLOT_STEP_MINUTES: i32 = 15;

/// Working ranges of one weekday of a template, merged and sorted.
pub fn working_ranges(hours: &WeeklyHours, date: NaiveDate) -> Result<Vec<MinuteRange>, BookingError> {
    let Some(day) = hours.day(weekday_key(date)) else {
        return Ok(Vec::new());
    };

    let mut ranges = Vec::with_capacity(day.len());
    for [start, end] in day {
        let range = MinuteRange::new(interval::parse_clock(start)?, interval::parse_clock(end)?);
        if range.is_empty() {
            return Err(BookingError::InvalidWorkingHours(format!(
                "{}-{} on {} does not end after it starts",
                start,
                end,
                weekday_key(date)
            )));
        }
        ranges.push(range);
    }
    Ok(interval::merge(&ranges))
}

/// Clips `[start, end)` windows to the given UTC day and expresses them as
/// minute-of-day ranges. Windows outside the day are dropped.
pub fn occupied_ranges<I>(date: NaiveDate, windows: I) -> Vec<MinuteRange>
where
    I: IntoIterator<Item = (DateTime<Utc>, DateTime<Utc>)>,
{
    let (day_start, day_end) = utc_day_bounds(date);
    let ranges: Vec<MinuteRange> = windows
        .into_iter()
        .filter(|(start, end)| *start < day_end && *end > day_start)
        .map(|(start, end)| {
            let start = start.max(day_start);
            let end = end.min(day_end);
            MinuteRange::new(
                (start - day_start).num_minutes() as i32,
                (end - day_start).num_minutes() as i32,
            )
        })
        .collect();
    interval::merge(&ranges)
}

/// Start minutes at `step` increments from each range's start such that
/// `start + duration` stays inside the range.
pub fn bookable_starts(free: &[MinuteRange], duration_minutes: i32, step_minutes: i32) -> Vec<MinuteRange> {
    if duration_minutes <= 0 || step_minutes <= 0 {
        return Vec::new();
    }

    let mut slots = Vec::new();
    for range in free {
        let mut start = range.start;
        while start + duration_minutes <= range.end {
            slots.push(MinuteRange::new(start, start + duration_minutes));
            start += step_minutes;
        }
    }
    slots
}

/// Computes free time and bookable slots for a provider's day.
#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn day_availability(
        &self,
        tenant_id: TenantId,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<FreeInterval>, BookingError> {
        let free = unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move { free_ranges_in(tx.as_mut(), tenant_id, provider_id, date).await })
        })
        .await?;

        Ok(free
            .into_iter()
            .map(|range| FreeInterval {
                start: interval::format_clock(range.start),
                end: interval::format_clock(range.end),
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn bookable_slots(
        &self,
        tenant_id: TenantId,
        provider_id: Uuid,
        service_id: Uuid,
        date: NaiveDate,
        step_minutes: Option<i32>,
    ) -> Result<Vec<BookableSlot>, BookingError> {
        let step = step_minutes.unwrap_or(DEFAULT_SLOT_STEP_MINUTES);
        if step <= 0 {
            return Err(BookingError::Validation("stepMinutes must be positive".to_string()));
        }

        let (duration, free) = unit_of_work(self.store.as_ref(), move |tx| {
            Box::pin(async move {
                let service = tx.service(service_id).await?.ok_or(BookingError::ServiceNotFound)?;
                if service.tenant_id != tenant_id {
                    return Err(BookingError::Forbidden("Service"));
                }
                let free = free_ranges_in(tx.as_mut(), tenant_id, provider_id, date).await?;
                Ok((service.duration_minutes, free))
            })
        })
        .await?;

        let (day_start, _) = utc_day_bounds(date);
        let slots: Vec<BookableSlot> = bookable_starts(&free, duration, step)
            .into_iter()
            .map(|slot| BookableSlot {
                start_at: day_start + Duration::minutes(slot.start as i64),
                end_at: day_start + Duration::minutes(slot.end as i64),
            })
            .collect();

        debug!("{} bookable slots for provider {} on {}", slots.len(), provider_id, date);
        Ok(slots)
    }
}

/// Template for a provider: its own, else its location's, else none.
pub(crate) async fn effective_template(
    tx: &mut dyn BookingTx,
    provider: &Provider,
) -> Result<Option<WeeklyHours>, BookingError> {
    if let Some(hours) = &provider.working_hours {
        return Ok(Some(hours.clone()));
    }
    Ok(tx.location(provider.location_id).await?.and_then(|l| l.working_hours))
}

pub(crate) async fn free_ranges_in(
    tx: &mut dyn BookingTx,
    tenant_id: TenantId,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<MinuteRange>, BookingError> {
    let provider = tx.provider(provider_id).await?.ok_or(BookingError::ProviderNotFound)?;
    if provider.tenant_id != tenant_id {
        return Err(BookingError::Forbidden("Provider"));
    }
    if !provider.is_active {
        debug!("Provider {} is inactive, no availability", provider_id);
        return Ok(Vec::new());
    }

    let Some(template) = effective_template(tx, &provider).await? else {
        return Ok(Vec::new());
    };
    let working = working_ranges(&template, date)?;
    if working.is_empty() {
        return Ok(Vec::new());
    }

    let (day_start, day_end) = utc_day_bounds(date);
    let blocks = tx.blocks_overlapping(tenant_id, provider_id, day_start, day_end).await?;
    let appointments = tx
        .appointments_overlapping(tenant_id, provider_id, day_start, day_end, None)
        .await?;

    let occupied = occupied_ranges(
        date,
        blocks
            .iter()
            .map(|b| (b.start_at, b.end_at))
            .chain(appointments.iter().map(|a| (a.start_at, a.end_at))),
    );

    Ok(interval::subtract(&working, &occupied))
}
