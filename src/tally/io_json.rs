// Labelled tables, as exported by statistical packages, and value label files.

use std::collections::HashMap;
use std::fs;

use daily_counts::{identity::canonical_string, LabelMap, RawTable, RawValue};
use serde_json::Value as JSValue;

use crate::tally::{
    io_common::{drop_blank_rows, simplify_file_name},
    *,
};

/// The on-disk shape of a labelled table.
///
/// ```json
/// {
///   "columns": ["enum", "consent", "int_date"],
///   "rows": [["A", 1, "2024-03-07"]],
///   "valueLabels": {"consent": {"1": "Yes", "2": "No"}}
/// }
/// ```
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct LabelledTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<JSValue>>,
    #[serde(rename = "valueLabels", default)]
    value_labels: HashMap<String, HashMap<String, String>>,
}

pub fn read_json_table(path: &str) -> TallyResult<RawTable> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let lt: LabelledTable =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!(
        "read_json_table: columns: {:?} labelled: {:?}",
        lt.columns,
        lt.value_labels.keys().collect::<Vec<_>>()
    );

    let mut rows: Vec<Vec<RawValue>> = lt
        .rows
        .iter()
        .map(|row| row.iter().map(json_to_raw).collect())
        .collect();
    let dropped = drop_blank_rows(&mut rows);
    if dropped > 0 {
        info!(
            "Skipped {} blank rows in {}",
            dropped,
            simplify_file_name(path)
        );
    }

    Ok(RawTable {
        columns: lt.columns.iter().map(|c| c.trim().to_string()).collect(),
        rows,
        value_labels: lt
            .value_labels
            .into_iter()
            .map(|(col, lm)| (col.trim().to_string(), to_label_map(lm)))
            .collect(),
    })
}

/// A file that only holds value labels: `{"column": {"code": "label"}}`.
pub fn read_labels(path: &str) -> TallyResult<HashMap<String, LabelMap>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let labels: HashMap<String, HashMap<String, String>> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(labels
        .into_iter()
        .map(|(col, lm)| (col.trim().to_string(), to_label_map(lm)))
        .collect())
}

// Codes are looked up with their canonical string: "1.0" and 1 both become "1".
fn to_label_map(lm: HashMap<String, String>) -> LabelMap {
    lm.into_iter()
        .map(|(code, label)| {
            let key = match code.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => canonical_string(&RawValue::Number(f)),
                _ => canonical_string(&RawValue::Text(code)),
            };
            (key, label)
        })
        .collect()
}

fn json_to_raw(v: &JSValue) -> RawValue {
    match v {
        JSValue::Null => RawValue::Empty,
        JSValue::Bool(b) => RawValue::Bool(*b),
        JSValue::Number(n) => match n.as_f64() {
            Some(f) => RawValue::Number(f),
            None => RawValue::Text(n.to_string()),
        },
        JSValue::String(s) if s.trim().is_empty() => RawValue::Empty,
        JSValue::String(s) => RawValue::Text(s.clone()),
        x => RawValue::Text(x.to_string()),
    }
}
