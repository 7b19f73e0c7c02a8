//! Arithmetic Hebrew calendar over fixed day numbers (R.D., 1 = 1 January 1 CE),
//! which is what chrono's `num_days_from_ce` counts.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

use super::CalendarError;

/// R.D. of 1 Tishrei AM 1
const EPOCH: i64 = -1_373_427;

pub const NISAN: u8 = 1;
pub const TISHRI: u8 = 7;
pub const MARHESHVAN: u8 = 8;
pub const KISLEV: u8 = 9;
pub const TEVET: u8 = 10;
pub const SHEVAT: u8 = 11;
pub const ADAR: u8 = 12;
pub const ADAR_II: u8 = 13;

/// Months are numbered from Nisan = 1; Adar II (13) exists only in leap years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HebrewDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl HebrewDate {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, CalendarError> {
        if month < 1 || month > last_month_of_year(year) {
            return Err(CalendarError::InvalidMonth { year, month });
        }
        if day < 1 || day > last_day_of_month(year, month) {
            return Err(CalendarError::InvalidDay { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.year, self.month)
    }
}

impl fmt::Display for HebrewDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.day, self.month_name(), self.year)
    }
}

pub fn month_name(year: i32, month: u8) -> &'static str {
    match month {
        1 => "Nisan",
        2 => "Iyar",
        3 => "Sivan",
        4 => "Tammuz",
        5 => "Av",
        6 => "Elul",
        7 => "Tishrei",
        8 => "Cheshvan",
        9 => "Kislev",
        10 => "Tevet",
        11 => "Shevat",
        12 if is_leap_year(year) => "Adar I",
        12 => "Adar",
        13 => "Adar II",
        _ => "?",
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (7 * i64::from(year) + 1).rem_euclid(19) < 7
}

pub fn last_month_of_year(year: i32) -> u8 {
    if is_leap_year(year) { ADAR_II } else { ADAR }
}

/// Days from the epoch to the molad of Tishrei, with the first postponement applied
fn elapsed_days(year: i32) -> i64 {
    let months_elapsed = (235 * i64::from(year) - 234).div_euclid(19);
    let parts_elapsed = 12_084 + 13_753 * months_elapsed;
    let days = 29 * months_elapsed + parts_elapsed.div_euclid(25_920);
    if (3 * (days + 1)).rem_euclid(7) < 3 { days + 1 } else { days }
}

/// Keeps year lengths within 353..=355 / 383..=385
fn year_length_correction(year: i32) -> i64 {
    let ny0 = elapsed_days(year - 1);
    let ny1 = elapsed_days(year);
    let ny2 = elapsed_days(year + 1);
    if ny2 - ny1 == 356 {
        2
    } else if ny1 - ny0 == 382 {
        1
    } else {
        0
    }
}

/// Fixed day of 1 Tishrei
pub fn new_year(year: i32) -> i64 {
    EPOCH + elapsed_days(year) + year_length_correction(year)
}

pub fn days_in_year(year: i32) -> i64 {
    new_year(year + 1) - new_year(year)
}

pub fn long_marheshvan(year: i32) -> bool {
    matches!(days_in_year(year), 355 | 385)
}

pub fn short_kislev(year: i32) -> bool {
    matches!(days_in_year(year), 353 | 383)
}

pub fn last_day_of_month(year: i32, month: u8) -> u8 {
    match month {
        2 | 4 | 6 | TEVET | ADAR_II => 29,
        ADAR if !is_leap_year(year) => 29,
        MARHESHVAN if !long_marheshvan(year) => 29,
        KISLEV if short_kislev(year) => 29,
        _ => 30,
    }
}

/// Fixed day of a Hebrew date. Day numbers past the month's end roll into
/// the next month, which the anniversary rules rely on.
pub fn fixed_from_hebrew(year: i32, month: u8, day: u8) -> i64 {
    let mut days = new_year(year) + i64::from(day) - 1;
    if month < TISHRI {
        for m in TISHRI..=last_month_of_year(year) {
            days += i64::from(last_day_of_month(year, m));
        }
        for m in NISAN..month {
            days += i64::from(last_day_of_month(year, m));
        }
    } else {
        for m in TISHRI..month {
            days += i64::from(last_day_of_month(year, m));
        }
    }
    days
}

pub fn hebrew_from_fixed(date: i64) -> HebrewDate {
    let approx = ((date - EPOCH) * 98_496).div_euclid(35_975_351) + 1;
    let mut year = (approx - 1) as i32;
    while new_year(year + 1) <= date {
        year += 1;
    }
    let mut month = if date < fixed_from_hebrew(year, NISAN, 1) { TISHRI } else { NISAN };
    while date > fixed_from_hebrew(year, month, last_day_of_month(year, month)) {
        month += 1;
    }
    let day = (date - fixed_from_hebrew(year, month, 1) + 1) as u8;
    HebrewDate { year, month, day }
}

pub fn to_fixed(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

pub fn from_fixed(fixed: i64) -> Result<NaiveDate, CalendarError> {
    i32::try_from(fixed)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(CalendarError::OutOfRange(fixed))
}

pub fn to_hebrew(date: NaiveDate) -> HebrewDate {
    hebrew_from_fixed(to_fixed(date))
}

pub fn to_gregorian(date: HebrewDate) -> Result<NaiveDate, CalendarError> {
    from_fixed(fixed_from_hebrew(date.year, date.month, date.day))
}

/// Fixed day on which a death on `month`/`day` is remembered in Hebrew year
/// `year`. `death_year` is known when the death has a full date; without it
/// the month-length rules are judged against the target year.
pub fn anniversary(death_year: Option<i32>, month: u8, day: u8, year: i32) -> i64 {
    let reference = death_year.map(|y| y + 1);
    if month == MARHESHVAN && day == 30 {
        let short = match reference {
            Some(next) => !long_marheshvan(next),
            None => !long_marheshvan(year),
        };
        if short {
            return fixed_from_hebrew(year, KISLEV, 1) - 1;
        }
    }
    if month == KISLEV && day == 30 {
        let short = match reference {
            Some(next) => short_kislev(next),
            None => short_kislev(year),
        };
        if short {
            return fixed_from_hebrew(year, TEVET, 1) - 1;
        }
    }
    if month == ADAR_II {
        return fixed_from_hebrew(year, last_month_of_year(year), day);
    }
    if month == ADAR && day == 30 && !is_leap_year(year) {
        return fixed_from_hebrew(year, SHEVAT, 30);
    }
    fixed_from_hebrew(year, month, day)
}

/// Gregorian year that contains 1 Tishrei of the given Hebrew year
pub fn gregorian_year_of_new_year(year: i32) -> Result<i32, CalendarError> {
    Ok(from_fixed(new_year(year))?.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rosh_hashana_dates() {
        assert_eq!(from_fixed(new_year(5784)).unwrap(), date(2023, 9, 16));
        assert_eq!(from_fixed(new_year(5785)).unwrap(), date(2024, 10, 3));
        assert_eq!(from_fixed(new_year(5786)).unwrap(), date(2025, 9, 23));
        assert_eq!(gregorian_year_of_new_year(5786).unwrap(), 2025);
    }

    #[test]
    fn leap_years_and_lengths() {
        assert!(is_leap_year(5784));
        assert!(!is_leap_year(5785));
        let lengths: Vec<i64> = (5780..5790).map(days_in_year).collect();
        assert_eq!(lengths, vec![355, 353, 384, 355, 383, 355, 354, 385, 355, 354]);
    }

    #[test]
    fn known_conversions() {
        assert_eq!(to_hebrew(date(2024, 4, 23)), HebrewDate { year: 5784, month: NISAN, day: 15 });
        assert_eq!(to_hebrew(date(2023, 12, 8)), HebrewDate { year: 5784, month: KISLEV, day: 25 });
        assert_eq!(to_hebrew(date(2024, 3, 24)), HebrewDate { year: 5784, month: ADAR_II, day: 14 });
        assert_eq!(to_gregorian(HebrewDate::new(5785, TISHRI, 10).unwrap()).unwrap(), date(2024, 10, 12));
        assert_eq!(to_hebrew(date(2000, 1, 1)).to_string(), "23 Tevet 5760");
    }

    #[test]
    fn round_trips_across_a_leap_year() {
        let start = to_fixed(date(2023, 9, 1));
        for fixed in start..start + 420 {
            let h = hebrew_from_fixed(fixed);
            assert_eq!(fixed_from_hebrew(h.year, h.month, h.day), fixed);
        }
    }

    #[test]
    fn rejects_missing_days() {
        assert!(HebrewDate::new(5785, ADAR_II, 1).is_err());
        assert!(HebrewDate::new(5786, MARHESHVAN, 30).is_err());
        assert!(HebrewDate::new(5785, MARHESHVAN, 30).is_ok());
        assert_eq!(month_name(5784, ADAR), "Adar I");
        assert_eq!(month_name(5785, ADAR), "Adar");
    }

    #[test]
    fn anniversary_rules() {
        // 30 Cheshvan 5780, and 5781 has a short Cheshvan
        assert_eq!(from_fixed(anniversary(Some(5780), MARHESHVAN, 30, 5785)).unwrap(), date(2024, 12, 1));
        assert_eq!(from_fixed(anniversary(Some(5780), MARHESHVAN, 30, 5786)).unwrap(), date(2025, 11, 20));
        // Adar II death in common years falls in Adar
        assert_eq!(from_fixed(anniversary(Some(5784), ADAR_II, 14, 5785)).unwrap(), date(2025, 3, 14));
        assert_eq!(from_fixed(anniversary(Some(5784), ADAR_II, 14, 5787)).unwrap(), date(2027, 3, 23));
        // 30 Adar I in a common year moves to 30 Shevat
        assert_eq!(from_fixed(anniversary(Some(5784), ADAR, 30, 5785)).unwrap(), date(2025, 2, 28));
        // plain date
        assert_eq!(from_fixed(anniversary(Some(5780), ADAR, 19, 5786)).unwrap(), date(2026, 3, 8));
        // without a death year the target year decides
        assert_eq!(from_fixed(anniversary(None, MARHESHVAN, 30, 5786)).unwrap(), date(2025, 11, 20));
    }
}
