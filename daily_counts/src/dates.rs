use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use log::debug;

use crate::config::*;

// Date-only layouts that are tried in order on text values. Slash dates are read month
// first, dash and dot dates day first. Two-digit years come first: `%Y` also accepts `24`,
// and whatever still parses to a year outside `MIN_YEAR..=MAX_YEAR` is rejected.
const DATE_FORMATS: [&str; 17] = [
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d-%b-%y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d%b%Y",
    "%b_%d_%Y",
];

/// Field dates outside these years are taken as misreadings and end up `Unknown`.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2200;

// Time-of-day suffixes accepted after any of the layouts above. The time is discarded.
const TIME_SUFFIXES: [&str; 4] = [" %H:%M:%S", " %H:%M", " %I:%M:%S %p", " %I:%M %p"];

/// Reads a field date with the spreadsheet convention for numeric serials.
pub fn normalize_date(raw: &RawValue) -> FieldDate {
    normalize_date_with(raw, SerialEpoch::Spreadsheet)
}

/// Reads a field date. Only the calendar date is kept.
///
/// Anything that cannot be read unambiguously as a date is `FieldDate::Unknown`. In
/// particular, numeric text is not taken as a serial: `"2024"` is a year, not a day count.
/// Integral numbers that spell a valid `YYYYMMDD` date are read as such, like their text form.
/// Dates outside `MIN_YEAR..=MAX_YEAR` are `Unknown` as well.
pub fn normalize_date_with(raw: &RawValue, epoch: SerialEpoch) -> FieldDate {
    let res = match raw {
        RawValue::Empty | RawValue::Bool(_) => None,
        RawValue::Number(f) => compact_number(*f).or_else(|| serial_to_date(*f, epoch)),
        RawValue::Text(s) => parse_date_text(s),
        RawValue::Date(d) => Some(*d),
        RawValue::DateTime(dt) => Some(dt.date()),
    };
    match res.and_then(plausible) {
        Some(d) => FieldDate::Known(d),
        None => FieldDate::Unknown,
    }
}

/// Converts a day count since the given epoch. Fractions of a day are time of day and are
/// dropped (floor, so that negative serials stay on the right day).
///
/// The range is not checked here: `normalize_date_with` rejects the implausible years.
pub fn serial_to_date(serial: f64, epoch: SerialEpoch) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    // Beyond chrono's range anyway, and keeps the cast below exact.
    if days.abs() > 1e8 {
        return None;
    }
    epoch
        .day_zero()
        .checked_add_signed(Duration::days(days as i64))
}

/// Converts a spreadsheet serial with a time component into a full timestamp.
pub fn serial_to_datetime(serial: f64, epoch: SerialEpoch) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial, epoch)?;
    let seconds = ((serial - serial.floor()) * 86_400.0).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Some(d) = parse_iso_prefix(t) {
        return Some(d);
    }
    if let Some(d) = parse_compact_digits(t) {
        return Some(d);
    }
    for fmt in DATE_FORMATS.iter() {
        if let Some(d) = NaiveDate::parse_from_str(t, fmt).ok().and_then(plausible) {
            return Some(d);
        }
        for suffix in TIME_SUFFIXES.iter() {
            let full = format!("{}{}", fmt, suffix);
            if let Some(d) = NaiveDateTime::parse_from_str(t, &full)
                .ok()
                .and_then(|dt| plausible(dt.date()))
            {
                return Some(d);
            }
        }
    }
    debug!("parse_date_text: could not read {:?} as a date", s);
    None
}

// `YYYY-MM-DD`, optionally followed by `T...` or ` ...` (time, offset, whatever).
// The offset is not applied: the date is the one written by the survey device.
fn parse_iso_prefix(t: &str) -> Option<NaiveDate> {
    let head = t.get(..10)?;
    match t.as_bytes().get(10) {
        None | Some(b'T') | Some(b't') | Some(b' ') => {}
        _ => return None,
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn plausible(d: NaiveDate) -> Option<NaiveDate> {
    if (MIN_YEAR..=MAX_YEAR).contains(&d.year()) {
        Some(d)
    } else {
        debug!("plausible: {} is out of range", d);
        None
    }
}

// A number such as 20240307, as stored by exports that keep dates as integers.
fn compact_number(f: f64) -> Option<NaiveDate> {
    if f.fract() != 0.0 || !(10_000_000.0..100_000_000.0).contains(&f) {
        return None;
    }
    parse_compact_digits(&format!("{}", f as i64))
}

// `YYYYMMDD`, the only all-digit text accepted.
fn parse_compact_digits(t: &str) -> Option<NaiveDate> {
    if t.len() != 8 || !t.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = t[..4].parse().ok()?;
    let month: u32 = t[4..6].parse().ok()?;
    let day: u32 = t[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> FieldDate {
        FieldDate::Known(NaiveDate::from_ymd_opt(y, m, day).unwrap())
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn iso_strings() {
        assert_eq!(normalize_date(&text("2024-03-07")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text(" 2024-03-07 ")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("2024-03-07T23:59:59")), d(2024, 3, 7));
        assert_eq!(
            normalize_date(&text("2024-03-07T23:59:59.123+05:00")),
            d(2024, 3, 7)
        );
        assert_eq!(normalize_date(&text("2024-03-07 08:15:00")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("2024-02-30")), FieldDate::Unknown);
        assert_eq!(normalize_date(&text("2024-03-07x")), FieldDate::Unknown);
    }

    #[test]
    fn locale_strings() {
        assert_eq!(normalize_date(&text("03/07/2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("3/7/2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("03/07/24")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("2024/03/07")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("07-03-2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("07.03.2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("7 Mar 2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("10 September 2025")), d(2025, 9, 10));
        assert_eq!(normalize_date(&text("Mar 7, 2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("March 7, 2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("07mar2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("10Sep2025")), d(2025, 9, 10));
        assert_eq!(normalize_date(&text("Mar_7_2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("20240307")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("2024-3-7")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("7-Mar-2024")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("07-Mar-24")), d(2024, 3, 7));
    }

    #[test]
    fn short_years() {
        assert_eq!(normalize_date(&text("07-03-24")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("07.03.24")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("7-3-24 14:05")), d(2024, 3, 7));
        // Year first with a short year is ambiguous.
        assert_eq!(normalize_date(&text("24/03/07")), FieldDate::Unknown);
        assert_eq!(normalize_date(&text("0024-03-07")), FieldDate::Unknown);
        assert_eq!(normalize_date(&text("7 Mar 24")), FieldDate::Unknown);
        assert_eq!(normalize_date(&text("Mar 7, 24")), FieldDate::Unknown);
    }

    #[test]
    fn time_of_day_is_dropped() {
        assert_eq!(normalize_date(&text("3/7/2024 14:05")), d(2024, 3, 7));
        assert_eq!(normalize_date(&text("3/7/2024 2:05:10 PM")), d(2024, 3, 7));
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(normalize_date(&RawValue::DateTime(dt)), d(2024, 3, 7));
    }

    #[test]
    fn serials() {
        // 45358 is 2024-03-07 in spreadsheets.
        assert_eq!(normalize_date(&RawValue::Number(45358.0)), d(2024, 3, 7));
        assert_eq!(normalize_date(&RawValue::Number(45358.99)), d(2024, 3, 7));
        // 23442 days after 1960-01-01.
        assert_eq!(
            normalize_date_with(&RawValue::Number(23442.0), SerialEpoch::Statistical),
            d(2024, 3, 7)
        );
        assert_eq!(
            normalize_date_with(&RawValue::Number(-1.0), SerialEpoch::Statistical),
            d(1959, 12, 31)
        );
        assert_eq!(normalize_date(&RawValue::Number(f64::NAN)), FieldDate::Unknown);
        assert_eq!(
            normalize_date(&RawValue::Number(f64::INFINITY)),
            FieldDate::Unknown
        );
        assert_eq!(normalize_date(&RawValue::Number(1e300)), FieldDate::Unknown);
    }

    #[test]
    fn numbers_out_of_range() {
        // Integers spelling YYYYMMDD are dates, as their text form.
        assert_eq!(normalize_date(&RawValue::Number(20240307.0)), d(2024, 3, 7));
        assert_eq!(
            normalize_date_with(&RawValue::Number(20240307.0), SerialEpoch::Statistical),
            d(2024, 3, 7)
        );
        // Neither a valid YYYYMMDD nor a plausible serial.
        assert_eq!(normalize_date(&RawValue::Number(20241399.0)), FieldDate::Unknown);
        assert_eq!(normalize_date(&RawValue::Number(20240307.5)), FieldDate::Unknown);
        assert_eq!(normalize_date(&RawValue::Number(5_000_000.0)), FieldDate::Unknown);
        assert_eq!(normalize_date(&RawValue::Number(-1.0)), FieldDate::Unknown);
        // Serials still work up to the edges of the accepted years.
        assert_eq!(normalize_date(&RawValue::Number(2.0)), d(1900, 1, 1));
        let late = NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31).unwrap();
        let serial = (late - SerialEpoch::Spreadsheet.day_zero()).num_days() as f64;
        assert_eq!(normalize_date(&RawValue::Number(serial)), FieldDate::Known(late));
        assert_eq!(
            normalize_date(&RawValue::Number(serial + 1.0)),
            FieldDate::Unknown
        );
        let old = NaiveDate::from_ymd_opt(1850, 1, 1).unwrap();
        assert_eq!(normalize_date(&RawValue::Date(old)), FieldDate::Unknown);
    }

    #[test]
    fn serial_with_time() {
        let dt = serial_to_datetime(45358.5, SerialEpoch::Spreadsheet).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn unknown_bucket() {
        for v in [
            RawValue::Empty,
            text(""),
            text("   "),
            text("yesterday"),
            text("2024"),
            text("45358"),
            text("13/45/2024"),
            RawValue::Bool(true),
        ] {
            assert_eq!(normalize_date(&v), FieldDate::Unknown, "{:?}", v);
        }
    }
}
