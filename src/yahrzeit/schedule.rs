use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::hebrew::{self, HebrewDate};
use super::CalendarError;
use crate::database::models::{Observance, Yahrzeit};

/// Hebrew month/day of the death, plus its year when the civil date is known.
/// A death after sunset belongs to the next Hebrew day.
pub fn hebrew_death_date(y: &Yahrzeit) -> Result<(Option<i32>, u8, u8), CalendarError> {
    if let Some(date) = y.date_of_death {
        let effective = if y.after_sunset { date + Duration::days(1) } else { date };
        let h = hebrew::to_hebrew(effective);
        return Ok((Some(h.year), h.month, h.day));
    }
    match (y.hebrew_month, y.hebrew_day) {
        (Some(month), Some(day)) if (1..=13).contains(&month) && (1..=30).contains(&day) => {
            Ok((None, month as u8, day as u8))
        }
        _ => Err(CalendarError::NoDate(y.id)),
    }
}

/// First anniversary on or after `today`.
pub fn next_occurrence(y: &Yahrzeit, today: NaiveDate) -> Result<NaiveDate, CalendarError> {
    match y.observance {
        Observance::Secular => next_secular(y, today),
        Observance::Hebrew => next_hebrew(y, today),
    }
}

fn next_hebrew(y: &Yahrzeit, today: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let (death_year, month, day) = hebrew_death_date(y)?;
    let current = hebrew::to_hebrew(today).year;
    let first = match death_year {
        Some(dy) => current.max(dy + 1),
        None => current,
    };
    let today_fixed = hebrew::to_fixed(today);
    for year in first..first + 2 {
        let fixed = hebrew::anniversary(death_year, month, day, year);
        if fixed >= today_fixed {
            return hebrew::from_fixed(fixed);
        }
    }
    Err(CalendarError::OutOfRange(today_fixed))
}

fn next_secular(y: &Yahrzeit, today: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let death = y.date_of_death.ok_or(CalendarError::NoDate(y.id))?;
    let first = today.year().max(death.year() + 1);
    for year in first..first + 2 {
        // 29 February is kept on the 28th in common years
        let candidate = NaiveDate::from_ymd_opt(year, death.month(), death.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, death.month(), death.day() - 1))
            .ok_or(CalendarError::OutOfRange(i64::from(year)))?;
        if candidate >= today {
            return Ok(candidate);
        }
    }
    Err(CalendarError::OutOfRange(hebrew::to_fixed(today)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Bucket {
    #[serde(rename = "This week")]
    ThisWeek,
    #[serde(rename = "Next week")]
    NextWeek,
    #[serde(rename = "This month")]
    ThisMonth,
    #[serde(rename = "Later")]
    Later,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::ThisWeek => "This week",
            Bucket::NextWeek => "Next week",
            Bucket::ThisMonth => "This month",
            Bucket::Later => "Later",
        }
    }

    /// Weeks run Sunday through Shabbat
    pub fn for_date(date: NaiveDate, today: NaiveDate) -> Bucket {
        let end_of_week = today + Duration::days(6 - i64::from(today.weekday().num_days_from_sunday()));
        if date <= end_of_week {
            Bucket::ThisWeek
        } else if date <= end_of_week + Duration::days(7) {
            Bucket::NextWeek
        } else if date.year() == today.year() && date.month() == today.month() {
            Bucket::ThisMonth
        } else {
            Bucket::Later
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Occurrence {
    pub yahrzeit: Yahrzeit,
    pub date: NaiveDate,
    pub hebrew_date: HebrewDate,
    pub days_until: i64,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketGroup {
    pub bucket: Bucket,
    pub label: &'static str,
    pub items: Vec<Occurrence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub items: Vec<Occurrence>,
}

/// Next occurrences within `horizon_days` of `today`, soonest first.
/// Records without a usable date are skipped with a warning.
pub fn upcoming(yahrzeits: Vec<Yahrzeit>, today: NaiveDate, horizon_days: i64) -> Vec<Occurrence> {
    let mut out: Vec<Occurrence> = yahrzeits
        .into_iter()
        .filter_map(|y| match next_occurrence(&y, today) {
            Ok(date) => Some((y, date)),
            Err(e) => {
                warn!("Skipping yahrzeit {}: {}", y.id, e);
                None
            }
        })
        .filter_map(|(y, date)| {
            let days_until = (date - today).num_days();
            (days_until <= horizon_days).then(|| Occurrence {
                hebrew_date: hebrew::to_hebrew(date),
                bucket: Bucket::for_date(date, today),
                yahrzeit: y,
                date,
                days_until,
            })
        })
        .collect();
    out.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.yahrzeit.deceased_name.to_lowercase().cmp(&b.yahrzeit.deceased_name.to_lowercase()))
    });
    out
}

/// Reminder-enabled yahrzeits falling within `days_before` days
pub fn due_reminders(yahrzeits: Vec<Yahrzeit>, today: NaiveDate, days_before: i64) -> Vec<Occurrence> {
    let enabled = yahrzeits.into_iter().filter(|y| y.reminder_enabled).collect();
    upcoming(enabled, today, days_before)
}

/// Non-empty buckets in display order; input order is kept inside a bucket
pub fn group_by_bucket(occurrences: Vec<Occurrence>) -> Vec<BucketGroup> {
    let mut groups: Vec<BucketGroup> = Vec::new();
    for bucket in [Bucket::ThisWeek, Bucket::NextWeek, Bucket::ThisMonth, Bucket::Later] {
        let items: Vec<Occurrence> = occurrences.iter().filter(|o| o.bucket == bucket).cloned().collect();
        if !items.is_empty() {
            groups.push(BucketGroup { bucket, label: bucket.label(), items });
        }
    }
    groups
}

pub fn group_by_month(occurrences: Vec<Occurrence>) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for occ in occurrences {
        let (year, month) = (occ.date.year(), occ.date.month());
        match groups.iter_mut().find(|g| g.year == year && g.month == month) {
            Some(group) => group.items.push(occ),
            None => groups.push(MonthGroup {
                year,
                month,
                label: occ.date.format("%B %Y").to_string(),
                items: vec![occ],
            }),
        }
    }
    groups.sort_by_key(|g| (g.year, g.month));
    groups
}
