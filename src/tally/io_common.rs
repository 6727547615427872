use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use daily_counts::{LabelMap, RawTable, RawValue};
use log::debug;

pub const DEFAULT_SHEET_NAME: &str = "Daily_survey_by_enum";

/// The file formats that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    /// Anything calamine reads: xlsx, xlsm, xlsb, xls, ods.
    Excel,
    /// A labelled table exported by a statistical package.
    Json,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Provider::Csv),
            "excel" | "xlsx" | "xls" | "ods" => Ok(Provider::Excel),
            "json" => Ok(Provider::Json),
            x => Err(format!("{:?} (expected one of csv, excel, json)", x)),
        }
    }
}

pub fn infer_provider(path: &str) -> Option<Provider> {
    let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "csv" => Some(Provider::Csv),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Provider::Excel),
        "json" => Some(Provider::Json),
        _ => None,
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The name of the workbook when none is given: stamped with the current day.
pub fn default_output_name() -> String {
    format!(
        "daily_survey_productivity_{}.xlsx",
        chrono::Local::now().format("%Y%m%d")
    )
}

pub fn cell_from_text(s: &str) -> RawValue {
    if s.trim().is_empty() {
        RawValue::Empty
    } else {
        RawValue::Text(s.to_string())
    }
}

pub fn is_blank_row(row: &[RawValue]) -> bool {
    row.iter().all(|c| c.is_missing())
}

/// Drops the rows that carry no value at all, returning how many were dropped.
pub fn drop_blank_rows(rows: &mut Vec<Vec<RawValue>>) -> usize {
    let before = rows.len();
    rows.retain(|r| !is_blank_row(r));
    let dropped = before - rows.len();
    if dropped > 0 {
        debug!("drop_blank_rows: dropped {} blank rows", dropped);
    }
    dropped
}

/// Adds labels read from a separate file. They take precedence over the embedded ones.
pub fn merge_labels(table: &mut RawTable, labels: HashMap<String, LabelMap>) {
    for (column, lm) in labels {
        table.value_labels.entry(column).or_default().extend(lm);
    }
}
