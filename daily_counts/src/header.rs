use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

use crate::config::*;

/// The display string for a date column.
///
/// Total over all the styles. The unknown-date bucket is always labelled `Unknown`.
///
/// `Compact` only keeps two digits of the year: dates a century apart get the same header.
/// Use [`headers_are_unique`] to detect it, and `Iso` to avoid it.
pub fn format_header(date: &FieldDate, style: DateHeaderStyle) -> String {
    let d = match date {
        FieldDate::Known(d) => d,
        FieldDate::Unknown => return UNKNOWN.to_string(),
    };
    let fmt = match style {
        DateHeaderStyle::Pretty => "%b %-d, %Y",
        DateHeaderStyle::Safe => "%b_%-d_%Y",
        DateHeaderStyle::Compact => "%m/%d/%y",
        DateHeaderStyle::Iso => "%Y-%m-%d",
    };
    d.format(fmt).to_string()
}

impl FromStr for DateHeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(DateHeaderStyle::Pretty),
            "safe" => Ok(DateHeaderStyle::Safe),
            "compact" => Ok(DateHeaderStyle::Compact),
            "iso" => Ok(DateHeaderStyle::Iso),
            x => Err(format!(
                "unknown date header style {:?} (expected one of pretty, safe, compact, iso)",
                x
            )),
        }
    }
}

impl Display for DateHeaderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DateHeaderStyle::Pretty => "pretty",
            DateHeaderStyle::Safe => "safe",
            DateHeaderStyle::Compact => "compact",
            DateHeaderStyle::Iso => "iso",
        };
        write!(f, "{}", s)
    }
}

/// True when no two dates get the same header in this style.
pub fn headers_are_unique(dates: &[FieldDate], style: DateHeaderStyle) -> bool {
    let headers: HashSet<String> = dates.iter().map(|d| format_header(d, style)).collect();
    headers.len() == dates.len()
}
