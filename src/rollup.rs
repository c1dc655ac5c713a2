use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dates::{day_key, week_key, week_key_of};
use crate::error::{NutritionError, Result};
use crate::nutrition::aggregate;
use crate::records::{JournalEntry, NutritionProfile};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutritionTotals {
    pub meal_count: usize,
    pub total_kcal: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

impl NutritionTotals {
    fn from_profile(meal_count: usize, profile: NutritionProfile) -> Self {
        Self {
            meal_count,
            total_kcal: profile.kcal,
            total_protein: profile.protein_g,
            total_carbs: profile.carbs_g,
            total_fat: profile.fat_g,
        }
    }
}

/// Per-field average over the days that have at least one journal entry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct NutritionAverage {
    pub days_logged: usize,
    pub avg_kcal: f64,
    pub avg_protein: f64,
    pub avg_carbs: f64,
    pub avg_fat: f64,
}

fn totals_of<'a, I>(entries: I) -> Result<NutritionTotals>
where
    I: IntoIterator<Item = &'a JournalEntry>,
{
    let mut snapshots = Vec::new();
    for entry in entries {
        entry.validate()?;
        snapshots.push(entry.nutrition());
    }
    // Snapshots already hold the eaten amount, so every factor is 1.
    let profile = aggregate(snapshots.iter().map(|p| (p, 1.0)))?;
    Ok(NutritionTotals::from_profile(snapshots.len(), profile))
}

pub fn daily_nutrition<Tz: TimeZone>(
    entries: &[JournalEntry],
    target_date: NaiveDate,
    tz: &Tz,
) -> Result<NutritionTotals> {
    totals_of(
        entries
            .iter()
            .filter(|e| day_key(&e.logged_at, tz) == target_date),
    )
}

/// Totals for the week containing `week_start`; any day of the week may be
/// passed, it is normalized to that week's Monday first.
pub fn weekly_nutrition(entries: &[JournalEntry], week_start: NaiveDate) -> Result<NutritionTotals> {
    let key = week_key(week_start);
    totals_of(entries.iter().filter(|e| week_key_of(&e.logged_at) == key))
}

pub fn daily_breakdown<Tz: TimeZone>(
    entries: &[JournalEntry],
    tz: &Tz,
) -> Result<BTreeMap<NaiveDate, NutritionTotals>> {
    let buckets = crate::dates::bucket_by_day(entries, |e| Some(e.logged_at), tz)?;
    let mut days = BTreeMap::new();
    for (day, bucket) in buckets {
        days.insert(day, totals_of(bucket)?);
    }
    Ok(days)
}

/// Averages daily totals over the trailing `window_days` ending at `end_date`
/// (inclusive). Days without entries are left out of the denominator; `None`
/// means nothing was logged in the window at all.
pub fn average_daily_nutrition<Tz: TimeZone>(
    entries: &[JournalEntry],
    end_date: NaiveDate,
    window_days: u32,
    tz: &Tz,
) -> Result<Option<NutritionAverage>> {
    if window_days == 0 {
        return Err(NutritionError::InvalidWindow);
    }
    // Windows reaching past the start of the calendar are clamped to it.
    let start_date = end_date
        .checked_sub_days(Days::new(u64::from(window_days) - 1))
        .unwrap_or(NaiveDate::MIN);

    let in_window: Vec<JournalEntry> = entries
        .iter()
        .filter(|e| {
            let day = day_key(&e.logged_at, tz);
            day >= start_date && day <= end_date
        })
        .cloned()
        .collect();

    let days = daily_breakdown(&in_window, tz)?;
    if days.is_empty() {
        log::debug!("no journal entries between {} and {}", start_date, end_date);
        return Ok(None);
    }

    let n = days.len() as f64;
    let sum = days.values().fold(NutritionTotals::default(), |acc, d| NutritionTotals {
        meal_count: acc.meal_count + d.meal_count,
        total_kcal: acc.total_kcal + d.total_kcal,
        total_protein: acc.total_protein + d.total_protein,
        total_carbs: acc.total_carbs + d.total_carbs,
        total_fat: acc.total_fat + d.total_fat,
    });

    Ok(Some(NutritionAverage {
        days_logged: days.len(),
        avg_kcal: sum.total_kcal / n,
        avg_protein: sum.total_protein / n,
        avg_carbs: sum.total_carbs / n,
        avg_fat: sum.total_fat / n,
    }))
}
