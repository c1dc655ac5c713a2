//! Day and week keys for grouping journal and meal-plan records.
//!
//! Day keys are local calendar dates in whatever zone the caller supplies.
//! Week keys are the Monday of the containing week and are always derived
//! from the UTC calendar date, so the same week is looked up no matter which
//! day of it (or which time of that day) a caller starts from.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use std::collections::BTreeMap;

use crate::error::{NutritionError, Result};

pub fn day_key<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// Monday of the week containing `date`. For the first, partial week of the
/// representable calendar this is [`NaiveDate::MIN`].
pub fn week_key(date: NaiveDate) -> NaiveDate {
    let back = match date.weekday() {
        Weekday::Sun => 6,
        other => u64::from(other.number_from_monday()) - 1,
    };
    date.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN)
}

pub fn week_key_of(timestamp: &DateTime<Utc>) -> NaiveDate {
    week_key(timestamp.date_naive())
}

/// Monday 00:00 UTC of the week containing `date`.
pub fn week_start_utc(date: NaiveDate) -> DateTime<Utc> {
    week_key(date).and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| NutritionError::InvalidTimestamp(raw.to_string()))
}

pub fn bucket_by_day<'a, T, F, Tz>(
    records: &'a [T],
    timestamp_of: F,
    tz: &Tz,
) -> Result<BTreeMap<NaiveDate, Vec<&'a T>>>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
    Tz: TimeZone,
{
    bucket_with(records, timestamp_of, |ts| day_key(ts, tz))
}

pub fn bucket_by_week<'a, T, F>(
    records: &'a [T],
    timestamp_of: F,
) -> Result<BTreeMap<NaiveDate, Vec<&'a T>>>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    bucket_with(records, timestamp_of, week_key_of)
}

fn bucket_with<'a, T, F, K>(
    records: &'a [T],
    timestamp_of: F,
    key_of: K,
) -> Result<BTreeMap<NaiveDate, Vec<&'a T>>>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
    K: Fn(&DateTime<Utc>) -> NaiveDate,
{
    let mut buckets: BTreeMap<NaiveDate, Vec<&'a T>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let ts = timestamp_of(record).ok_or(NutritionError::MissingTimestamp(index))?;
        buckets.entry(key_of(&ts)).or_default().push(record);
    }
    Ok(buckets)
}
