use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::config::*;

/// The canonical string form of a raw value.
///
/// Whitespace is trimmed and internal runs are collapsed to a single space. The case is
/// kept as written: `"alice"` and `"Alice"` are different enumerators. Integral numbers are
/// written without a fractional part so that `3.0` read from a spreadsheet matches the
/// code `3` of a value label.
pub fn canonical_string(raw: &RawValue) -> String {
    match raw {
        RawValue::Empty => "".to_string(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Number(f) if f.is_nan() => "".to_string(),
        RawValue::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        RawValue::Number(f) => f.to_string(),
        RawValue::Text(s) => collapse_whitespace(s),
        RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        RawValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Resolves an enumerator or village value to the string used for grouping and display.
///
/// Missing values become the `UNKNOWN` sentinel, which is grouped like any other value.
pub fn resolve_identity(raw: &RawValue, labels: Option<&LabelMap>) -> String {
    if raw.is_missing() {
        return UNKNOWN.to_string();
    }
    let code = canonical_string(raw);
    match labels.and_then(|m| m.get(&code)) {
        Some(label) if !label.trim().is_empty() => collapse_whitespace(label),
        _ => code,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Makes all the column names unique and non-blank.
///
/// The first occurrence of a name is kept. Later occurrences get a positional suffix:
/// the second `enum` becomes `enum_2`, the third `enum_3`, skipping any suffix that would
/// collide with another column of the schema. Blank names become `column_N` where `N` is the
/// 1-based position of the column.
///
/// Returns the new schema (same length and order) and the list of renamed columns.
pub fn dedupe_column_names(columns: &[String]) -> (Vec<String>, Vec<RenamedColumn>) {
    let reserved: HashSet<&str> = columns
        .iter()
        .map(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let mut res: Vec<String> = Vec::with_capacity(columns.len());
    let mut renamed: Vec<RenamedColumn> = Vec::new();

    for (idx, name) in columns.iter().enumerate() {
        let (base, kind, mut suffix) = if name.trim().is_empty() {
            (format!("column_{}", idx + 1), WarningKind::BlankColumnName, 1)
        } else {
            let seen = occurrences.entry(name.as_str()).or_insert(0);
            *seen += 1;
            if *seen == 1 && !assigned.contains(name) {
                assigned.insert(name.clone());
                res.push(name.clone());
                continue;
            }
            (name.clone(), WarningKind::DuplicateColumnName, *seen)
        };

        let is_free =
            |candidate: &String| !assigned.contains(candidate) && !reserved.contains(candidate.as_str());
        let mut candidate = if kind == WarningKind::BlankColumnName {
            base.clone()
        } else {
            format!("{}_{}", base, suffix)
        };
        while !is_free(&candidate) {
            suffix += 1;
            candidate = format!("{}_{}", base, suffix);
        }

        warn!(
            "dedupe_column_names: {} at position {}: {:?} renamed to {:?}",
            kind,
            idx + 1,
            name,
            candidate
        );
        assigned.insert(candidate.clone());
        renamed.push(RenamedColumn {
            position: idx,
            original: name.clone(),
            renamed: candidate.clone(),
            kind,
        });
        res.push(candidate);
    }
    debug!("dedupe_column_names: final schema: {:?}", res);
    (res, renamed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_string(&RawValue::Number(3.0)), "3");
        assert_eq!(canonical_string(&RawValue::Number(-12.0)), "-12");
        assert_eq!(canonical_string(&RawValue::Number(2.5)), "2.5");
        assert_eq!(canonical_string(&"  Jane   Doe ".into()), "Jane Doe");
        assert_eq!(canonical_string(&RawValue::Bool(true)), "true");
        assert_eq!(canonical_string(&RawValue::Empty), "");
    }

    #[test]
    fn resolve_without_labels() {
        assert_eq!(resolve_identity(&" Alice ".into(), None), "Alice");
        assert_eq!(resolve_identity(&RawValue::Number(7.0), None), "7");
        assert_eq!(resolve_identity(&RawValue::Empty, None), UNKNOWN);
        assert_eq!(resolve_identity(&"   ".into(), None), UNKNOWN);
    }

    #[test]
    fn resolve_with_labels() {
        let mut labels = LabelMap::new();
        labels.insert("7".to_string(), "Grace  Hopper".to_string());
        labels.insert("8".to_string(), " ".to_string());
        let l = Some(&labels);
        assert_eq!(resolve_identity(&RawValue::Number(7.0), l), "Grace Hopper");
        assert_eq!(resolve_identity(&"7".into(), l), "Grace Hopper");
        // Blank labels are ignored.
        assert_eq!(resolve_identity(&RawValue::Number(8.0), l), "8");
        // Codes without a label are kept as they are.
        assert_eq!(resolve_identity(&RawValue::Number(9.0), l), "9");
        // Missing values never go through the labels.
        assert_eq!(resolve_identity(&RawValue::Empty, l), UNKNOWN);
    }

    #[test]
    fn unique_columns_are_untouched() {
        let cols = names(&["consent", "enum", "int_date"]);
        let (res, renamed) = dedupe_column_names(&cols);
        assert_eq!(res, cols);
        assert!(renamed.is_empty());
    }

    #[test]
    fn duplicate_gets_positional_suffix() {
        let (res, renamed) = dedupe_column_names(&names(&["enum", "consent", "enum"]));
        assert_eq!(res, names(&["enum", "consent", "enum_2"]));
        assert_eq!(
            renamed,
            vec![RenamedColumn {
                position: 2,
                original: "enum".to_string(),
                renamed: "enum_2".to_string(),
                kind: WarningKind::DuplicateColumnName,
            }]
        );
    }

    #[test]
    fn suffix_skips_existing_names() {
        let (res, _) = dedupe_column_names(&names(&["enum", "enum", "enum_2", "enum"]));
        assert_eq!(res, names(&["enum", "enum_3", "enum_2", "enum_4"]));
    }

    #[test]
    fn blank_names() {
        let (res, renamed) = dedupe_column_names(&names(&["a", "", " ", "column_2"]));
        assert_eq!(res, names(&["a", "column_2_2", "column_3", "column_2"]));
        assert_eq!(renamed.len(), 2);
        assert!(renamed
            .iter()
            .all(|r| r.kind == WarningKind::BlankColumnName));
    }
}
