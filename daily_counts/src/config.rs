// ********* Input data structures ***********

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};

/// The sentinel used for any enumerator or village value that is missing.
pub const UNKNOWN: &str = "Unknown";

/// A single cell, as read from the input file.
///
/// Readers are expected to preserve as much of the original typing as they can:
/// spreadsheet date cells should become `DateTime`, CSV cells are always `Text` or `Empty`.
#[derive(PartialEq, Debug, Clone)]
pub enum RawValue {
    /// A missing cell (empty string in text formats, null in JSON).
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawValue {
    /// True for values that carry no information at all (empty cells, blank strings).
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Number(f)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Number(i as f64)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(o: Option<T>) -> Self {
        o.map(|x| x.into()).unwrap_or(RawValue::Empty)
    }
}

/// One input row. The values are positional and aligned with the schema of the table.
pub type RawRecord = Vec<RawValue>;

/// Coded value (in its canonical string form, see `identity::canonical_string`) to display label.
pub type LabelMap = BTreeMap<String, String>;

/// A table as handed over by a file reader.
///
/// The column names are kept as they were read: duplicates and blank names are allowed here and
/// get resolved by `identity::dedupe_column_names` before any mapping is applied.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
    /// Value labels, keyed by column name. Absent columns simply have no labels.
    pub value_labels: HashMap<String, LabelMap>,
}

// ******** Normalized data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ConsentStatus {
    Yes,
    No,
    Unknown,
}

impl ConsentStatus {
    pub const ALL: [ConsentStatus; 3] =
        [ConsentStatus::Yes, ConsentStatus::No, ConsentStatus::Unknown];

    pub fn label(&self) -> &'static str {
        match self {
            ConsentStatus::Yes => "Yes",
            ConsentStatus::No => "No",
            ConsentStatus::Unknown => UNKNOWN,
        }
    }
}

/// A calendar date, or the bucket for everything that could not be read as one.
///
/// The derived ordering puts every known date (chronologically) before `Unknown`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum FieldDate {
    Known(NaiveDate),
    Unknown,
}

/// How numeric date serials are interpreted.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum SerialEpoch {
    /// Day 0 is 1899-12-30 (Excel, LibreOffice, Google Sheets).
    #[default]
    Spreadsheet,
    /// Day 0 is 1960-01-01 (Stata `%td`, SAS).
    Statistical,
}

impl SerialEpoch {
    pub fn day_zero(&self) -> NaiveDate {
        match self {
            SerialEpoch::Spreadsheet => NaiveDate::from_ymd_opt(1899, 12, 30),
            SerialEpoch::Statistical => NaiveDate::from_ymd_opt(1960, 1, 1),
        }
        .unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct GroupKey {
    pub enumerator: String,
    /// Only present when a village column was mapped.
    pub village: Option<String>,
}

impl GroupKey {
    pub fn enumerator(name: &str) -> GroupKey {
        GroupKey {
            enumerator: name.to_string(),
            village: None,
        }
    }

    pub fn with_village(name: &str, village: &str) -> GroupKey {
        GroupKey {
            enumerator: name.to_string(),
            village: Some(village.to_string()),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct NormalizedRecord {
    pub date: FieldDate,
    pub key: GroupKey,
    pub status: ConsentStatus,
}

// ******** Output data structures *********

/// Counts for one (group, date) cell, or for any sum of cells.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct StatusCounts {
    pub yes: u64,
    pub no: u64,
    pub unknown: u64,
}

impl StatusCounts {
    pub const EMPTY: StatusCounts = StatusCounts {
        yes: 0,
        no: 0,
        unknown: 0,
    };

    /// Unknown consent is part of the total, so that the totals add up to the number of records.
    pub fn total(&self) -> u64 {
        self.yes + self.no + self.unknown
    }

    pub fn get(&self, status: ConsentStatus) -> u64 {
        match status {
            ConsentStatus::Yes => self.yes,
            ConsentStatus::No => self.no,
            ConsentStatus::Unknown => self.unknown,
        }
    }
}

impl std::ops::AddAssign for StatusCounts {
    fn add_assign(&mut self, rhs: StatusCounts) {
        self.yes += rhs.yes;
        self.no += rhs.no;
        self.unknown += rhs.unknown;
    }
}

impl std::iter::Sum for StatusCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut acc = StatusCounts::EMPTY;
        for sc in iter {
            acc += sc;
        }
        acc
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatrixRow {
    pub key: GroupKey,
    /// One entry per date of the matrix, in the same order.
    pub cells: Vec<StatusCounts>,
    /// Sum over all the dates.
    pub total: StatusCounts,
}

/// The pivoted result: dense, sorted and immutable once built.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct OutputMatrix {
    pub dates: Vec<FieldDate>,
    pub rows: Vec<MatrixRow>,
    /// Sum over all the groups, one entry per date.
    pub date_totals: Vec<StatusCounts>,
    pub grand_total: StatusCounts,
}

// ********* Configuration **********

/// The logical roles that a column can play.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Role {
    Consent,
    Enumerator,
    Village,
    FieldDate,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Consent => "consent",
            Role::Enumerator => "enumerator",
            Role::Village => "village",
            Role::FieldDate => "field date",
        };
        write!(f, "{}", s)
    }
}

/// The assignment of the logical roles to column names.
///
/// The village is optional; every other role has to be filled before the tally can run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnMapping {
    pub consent: Option<String>,
    pub enumerator: Option<String>,
    pub village: Option<String>,
    pub field_date: Option<String>,
}

impl ColumnMapping {
    /// The column names picked when nothing else was specified.
    pub const DEFAULT_CONSENT: &'static str = "consent";
    pub const DEFAULT_ENUMERATOR: &'static str = "enum";
    pub const DEFAULT_FIELD_DATE: &'static str = "int_date";

    /// Fills the unassigned required roles with the conventional column names, when the
    /// schema has them. The village is never guessed.
    pub fn fill_defaults(&mut self, columns: &[String]) {
        let pick = |slot: &mut Option<String>, name: &str| {
            if slot.is_none() && columns.iter().any(|c| c == name) {
                *slot = Some(name.to_string());
            }
        };
        pick(&mut self.consent, Self::DEFAULT_CONSENT);
        pick(&mut self.enumerator, Self::DEFAULT_ENUMERATOR);
        pick(&mut self.field_date, Self::DEFAULT_FIELD_DATE);
    }

    pub fn get(&self, role: Role) -> Option<&String> {
        match role {
            Role::Consent => self.consent.as_ref(),
            Role::Enumerator => self.enumerator.as_ref(),
            Role::Village => self.village.as_ref(),
            Role::FieldDate => self.field_date.as_ref(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum DateHeaderStyle {
    /// `Mar 7, 2024`
    #[default]
    Pretty,
    /// `Mar_7_2024`
    Safe,
    /// `03/07/24`
    Compact,
    /// `2024-03-07`
    Iso,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TallySettings {
    pub mapping: ColumnMapping,
    pub serial_epoch: SerialEpoch,
}

// ********* Data quality reporting **********

/// The irregularities that are absorbed into the `Unknown` buckets instead of failing the run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum WarningKind {
    DuplicateColumnName,
    BlankColumnName,
    MissingDate,
    UnparseableDate,
    MissingConsent,
    UnrecognizedConsent,
    MissingEnumerator,
    MissingVillage,
}

impl Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WarningKind::DuplicateColumnName => "duplicate column name",
            WarningKind::BlankColumnName => "blank column name",
            WarningKind::MissingDate => "missing field date",
            WarningKind::UnparseableDate => "unparseable field date",
            WarningKind::MissingConsent => "missing consent",
            WarningKind::UnrecognizedConsent => "unrecognized consent value",
            WarningKind::MissingEnumerator => "missing enumerator",
            WarningKind::MissingVillage => "missing village",
        };
        write!(f, "{}", s)
    }
}

/// A column that was renamed before the mapping was applied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RenamedColumn {
    /// 0-based position in the schema.
    pub position: usize,
    pub original: String,
    pub renamed: String,
    /// Either `DuplicateColumnName` or `BlankColumnName`.
    pub kind: WarningKind,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DataQualityReport {
    pub counts: BTreeMap<WarningKind, u64>,
    pub renamed_columns: Vec<RenamedColumn>,
}

impl DataQualityReport {
    pub fn record(&mut self, kind: WarningKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: WarningKind) -> u64 {
        self.counts.get(&kind).cloned().unwrap_or(0)
    }

    pub fn is_clean(&self) -> bool {
        self.counts.values().all(|c| *c == 0)
    }
}

/// Everything a successful run produces.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyOutcome {
    pub matrix: OutputMatrix,
    pub report: DataQualityReport,
    /// The schema after deduplication, which is what the mapping was resolved against.
    pub columns: Vec<String>,
    pub num_records: u64,
}

/// Errors that prevent the tally from starting. Nothing is processed when one of them occurs.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// A required role has no column assigned.
    MissingRole(Role),
    /// The column assigned to a role does not exist in the (deduplicated) schema.
    UnknownColumn { role: Role, column: String },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::MissingRole(role) => {
                write!(f, "no column selected for the {} role", role)
            }
            TallyErrors::UnknownColumn { role, column } => write!(
                f,
                "column {:?} selected for the {} role is not in the data",
                column, role
            ),
        }
    }
}
