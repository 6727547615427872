use std::collections::HashMap;

use log::{debug, warn};

pub use crate::config::*;
use crate::consent::normalize_consent_labelled;
use crate::dates::normalize_date_with;
use crate::identity::{dedupe_column_names, resolve_identity};

static MISSING: RawValue = RawValue::Empty;

/// Positions of the mapped columns in the deduplicated schema.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct ResolvedColumns {
    consent: usize,
    enumerator: usize,
    village: Option<usize>,
    field_date: usize,
}

/// A builder for adding records one row at a time.
///
/// The schema is deduplicated and the column mapping is checked when the builder is created,
/// so that a bad mapping fails before a single row is read.
///
/// ```
/// use daily_counts::builder::Builder;
/// use daily_counts::*;
///
/// let settings = TallySettings {
///     mapping: ColumnMapping {
///         consent: Some("consent".to_string()),
///         enumerator: Some("enum".to_string()),
///         village: None,
///         field_date: Some("int_date".to_string()),
///     },
///     ..Default::default()
/// };
/// let columns = vec!["enum".to_string(), "int_date".to_string(), "consent".to_string()];
///
/// let mut builder = Builder::new(&columns, &settings)?;
/// builder.add_record(&["Alice".into(), "2024-01-01".into(), RawValue::Number(1.0)]);
/// builder.add_record(&["Alice".into(), "".into(), "no".into()]);
///
/// let outcome = builder.finish();
/// assert_eq!(outcome.matrix.grand_total.total(), 2);
/// assert_eq!(outcome.report.count(WarningKind::MissingDate), 1);
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _settings: TallySettings,
    pub(crate) _columns: Vec<String>,
    pub(crate) _records: Vec<NormalizedRecord>,
    pub(crate) _report: DataQualityReport,
    resolved: ResolvedColumns,
    consent_labels: Option<LabelMap>,
    enumerator_labels: Option<LabelMap>,
    village_labels: Option<LabelMap>,
}

impl Builder {
    pub fn new(columns: &[String], settings: &TallySettings) -> Result<Builder, TallyErrors> {
        let (deduped, renamed) = dedupe_column_names(columns);
        let mut report = DataQualityReport::default();
        for r in renamed.iter() {
            report.record(r.kind);
        }
        report.renamed_columns = renamed;

        let mapping = &settings.mapping;
        let resolved = ResolvedColumns {
            consent: find_required(&deduped, mapping, Role::Consent)?,
            enumerator: find_required(&deduped, mapping, Role::Enumerator)?,
            village: match mapping.village.as_ref() {
                Some(c) if !c.is_empty() => Some(find_column(&deduped, Role::Village, c)?),
                _ => None,
            },
            field_date: find_required(&deduped, mapping, Role::FieldDate)?,
        };
        debug!(
            "Builder::new: schema {:?}, resolved columns: {:?}",
            deduped, resolved
        );

        Ok(Builder {
            _settings: settings.clone(),
            _columns: deduped,
            _records: Vec::new(),
            _report: report,
            resolved,
            consent_labels: None,
            enumerator_labels: None,
            village_labels: None,
        })
    }

    /// Attaches the value labels of the mapped columns. Labels are looked up under the
    /// deduplicated column names.
    pub fn value_labels(self, labels: &HashMap<String, LabelMap>) -> Builder {
        let lookup = |idx: usize| {
            self._columns
                .get(idx)
                .and_then(|name| labels.get(name))
                .cloned()
        };
        let consent_labels = lookup(self.resolved.consent);
        let enumerator_labels = lookup(self.resolved.enumerator);
        let village_labels = self.resolved.village.and_then(lookup);
        debug!(
            "Builder::value_labels: consent: {}, enumerator: {}, village: {}",
            consent_labels.is_some(),
            enumerator_labels.is_some(),
            village_labels.is_some()
        );
        Builder {
            consent_labels,
            enumerator_labels,
            village_labels,
            ..self
        }
    }

    /// The deduplicated schema that the mapping was resolved against.
    pub fn columns(&self) -> &[String] {
        &self._columns
    }

    /// Normalizes one row and keeps it for the aggregation.
    ///
    /// This never fails: every irregularity is counted in the report and the value goes to
    /// the corresponding `Unknown` bucket. Short rows are padded with missing values.
    pub fn add_record(&mut self, record: &[RawValue]) {
        let get = |idx: usize| record.get(idx).unwrap_or(&MISSING);

        let raw_date = get(self.resolved.field_date);
        let date = normalize_date_with(raw_date, self._settings.serial_epoch);
        if raw_date.is_missing() {
            self._report.record(WarningKind::MissingDate);
        } else if date == FieldDate::Unknown {
            self._report.record(WarningKind::UnparseableDate);
        }

        let raw_consent = get(self.resolved.consent);
        let status = normalize_consent_labelled(raw_consent, self.consent_labels.as_ref());
        if raw_consent.is_missing() {
            self._report.record(WarningKind::MissingConsent);
        } else if status == ConsentStatus::Unknown {
            self._report.record(WarningKind::UnrecognizedConsent);
        }

        let raw_enumerator = get(self.resolved.enumerator);
        if raw_enumerator.is_missing() {
            self._report.record(WarningKind::MissingEnumerator);
        }
        let enumerator = resolve_identity(raw_enumerator, self.enumerator_labels.as_ref());

        let village = self.resolved.village.map(|idx| {
            let raw_village = get(idx);
            if raw_village.is_missing() {
                self._report.record(WarningKind::MissingVillage);
            }
            resolve_identity(raw_village, self.village_labels.as_ref())
        });

        let nr = NormalizedRecord {
            date,
            key: GroupKey {
                enumerator,
                village,
            },
            status,
        };
        debug!("add_record: {:?} -> {:?}", record, nr);
        self._records.push(nr);
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self._records
    }

    pub fn report(&self) -> &DataQualityReport {
        &self._report
    }

    /// Runs the aggregation on all the records added so far.
    pub fn finish(self) -> TallyOutcome {
        for (kind, count) in self._report.counts.iter() {
            if *count > 0 {
                warn!("data quality: {} x {}", count, kind);
            }
        }
        let matrix = crate::aggregate(&self._records);
        TallyOutcome {
            matrix,
            num_records: self._records.len() as u64,
            report: self._report,
            columns: self._columns,
        }
    }
}

fn find_required(columns: &[String], mapping: &ColumnMapping, role: Role) -> Result<usize, TallyErrors> {
    match mapping.get(role) {
        Some(c) if !c.is_empty() => find_column(columns, role, c),
        _ => Err(TallyErrors::MissingRole(role)),
    }
}

fn find_column(columns: &[String], role: Role, name: &str) -> Result<usize, TallyErrors> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| TallyErrors::UnknownColumn {
            role,
            column: name.to_string(),
        })
}
