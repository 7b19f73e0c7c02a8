use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Accepts the supported textual formats and spreadsheet serial day numbers.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // "2024-01-05T00:00:00" / "2024-01-05 00:00:00"
    let date_part = trimmed.split(&['T', ' '][..]).next().unwrap_or(trimmed);
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }
    serial_to_date(trimmed)
}

/// Serials typed as text need five digits or a fraction; a bare "2024" is a year, not a day count
fn serial_to_date(raw: &str) -> Option<NaiveDate> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if whole.len() < 5 && fraction.is_empty() {
        return None;
    }
    serial_date(f64::from_str(raw).ok()?)
}

/// Excel day serials; 60 and below straddle the 1900 leap-year bug and are refused
fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !(61.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Numeric date cells from a workbook
pub fn serial_to_iso(serial: f64) -> Option<String> {
    serial_date(serial).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Amount with an optional currency symbol or code and thousands separators.
/// Returns the currency the symbol implies, if any.
pub fn parse_amount(raw: &str) -> Option<(Decimal, Option<&'static str>)> {
    let trimmed = raw.trim();
    let currency = if trimmed.contains('$') {
        Some("USD")
    } else if trimmed.contains('₪') {
        Some("ILS")
    } else if trimmed.contains('€') {
        Some("EUR")
    } else if trimmed.contains('£') {
        Some("GBP")
    } else {
        None
    };

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let number = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // 1.234,56
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // 1,234 or 12,50
        (None, Some(comma)) => {
            let decimals = cleaned.len() - comma - 1;
            if decimals == 3 { cleaned.replace(',', "") } else { cleaned.replace(',', ".") }
        }
        _ => cleaned,
    };
    Decimal::from_str(&number).ok().map(|d| (d, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn accepts_supported_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("03/05/2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("05.03.2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T00:00:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("45356"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("13/45/2024"), None);
        assert_eq!(parse_date("45356.25"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn bare_years_are_not_serials() {
        assert_eq!(parse_date("2024"), None);
        assert_eq!(parse_date("1999"), None);
        assert_eq!(serial_to_iso(366.0), Some("1900-12-31".to_string()));
    }

    #[test]
    fn amounts_with_symbols_and_separators() {
        assert_eq!(parse_amount("$1,234.50"), Some((dec("1234.50"), Some("USD"))));
        assert_eq!(parse_amount("₪ 180"), Some((dec("180"), Some("ILS"))));
        assert_eq!(parse_amount("1.234,56 €"), Some((dec("1234.56"), Some("EUR"))));
        assert_eq!(parse_amount("12,50"), Some((dec("12.50"), None)));
        assert_eq!(parse_amount("1,800"), Some((dec("1800"), None)));
        assert_eq!(parse_amount("-5"), Some((dec("-5"), None)));
        assert_eq!(parse_amount("n/a"), None);
    }
}
