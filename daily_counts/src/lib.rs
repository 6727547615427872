/*!

Normalization and pivoting of survey records into a daily productivity sheet.

The pipeline turns a raw table (as read from a spreadsheet, a CSV file or a statistical
package export) into an [`OutputMatrix`]: for every enumerator (optionally every
enumerator × village) and every field date, how many interviews got a consent `Yes`, a
consent `No`, or an unreadable consent.

Two properties hold for every successful run:
- every input row is counted exactly once: the grand total equals the number of rows;
- the totals reconcile: row totals are the sums of their cells, the total row is the
  sum of all the rows.

Irregular values never stop a run. They are sent to `Unknown` buckets (unknown date,
unknown consent, `Unknown` enumerator) and counted in a [`DataQualityReport`].

See the [manual](manual/index.html) for the accepted encodings.
*/
pub mod builder;
mod config;
pub mod consent;
pub mod dates;
pub mod header;
pub mod identity;
pub mod manual;

use log::{debug, info};

use std::{
    collections::{BTreeSet, HashMap},
    ops::AddAssign,
};

pub use crate::config::*;
pub use crate::consent::{canonical_consent, normalize_consent};
pub use crate::dates::normalize_date;
pub use crate::header::format_header;
pub use crate::identity::{dedupe_column_names, resolve_identity};

use crate::builder::Builder;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct Count(u64);

impl Count {
    const EMPTY: Count = Count(0);
}

impl AddAssign for Count {
    fn add_assign(&mut self, rhs: Count) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Count {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Count(iter.map(|c| c.0).sum())
    }
}

// (date, group, status) -> count. Only the observed combinations are present.
type CountCells = HashMap<(FieldDate, GroupKey, ConsentStatus), Count>;

/// Runs the whole pipeline on a table.
///
/// Column names are deduplicated first, then the mapping is resolved: a mapping error is
/// returned before any row is read. Everything after that cannot fail.
pub fn run_tally(table: &RawTable, settings: &TallySettings) -> Result<TallyOutcome, TallyErrors> {
    info!(
        "run_tally: {} columns, {} rows, mapping: {:?}",
        table.columns.len(),
        table.rows.len(),
        settings.mapping
    );
    let mut builder = Builder::new(&table.columns, settings)?.value_labels(&table.value_labels);
    for row in table.rows.iter() {
        builder.add_record(row);
    }
    Ok(builder.finish())
}

/// Pivots normalized records into the dense count matrix.
///
/// Rows are the observed groups in lexicographic order, columns are the observed dates in
/// chronological order with the unknown date last. Combinations that were not observed are
/// explicit zeros. An empty input gives an empty matrix with a zero grand total.
pub fn aggregate(records: &[NormalizedRecord]) -> OutputMatrix {
    info!("aggregate: processing {} records", records.len());

    let cells = count_cells(records);
    let keys: BTreeSet<&GroupKey> = cells.keys().map(|(_, k, _)| k).collect();
    let dates: Vec<FieldDate> = cells
        .keys()
        .map(|(d, _, _)| *d)
        .collect::<BTreeSet<FieldDate>>()
        .into_iter()
        .collect();
    debug!(
        "aggregate: {} count cells, {} groups, {} dates",
        cells.len(),
        keys.len(),
        dates.len()
    );

    let lookup = |date: &FieldDate, key: &GroupKey, status: ConsentStatus| -> u64 {
        cells
            .get(&(*date, key.clone(), status))
            .cloned()
            .unwrap_or(Count::EMPTY)
            .0
    };

    let mut rows: Vec<MatrixRow> = Vec::with_capacity(keys.len());
    for key in keys {
        let row_cells: Vec<StatusCounts> = dates
            .iter()
            .map(|d| StatusCounts {
                yes: lookup(d, key, ConsentStatus::Yes),
                no: lookup(d, key, ConsentStatus::No),
                unknown: lookup(d, key, ConsentStatus::Unknown),
            })
            .collect();
        let total: StatusCounts = row_cells.iter().cloned().sum();
        rows.push(MatrixRow {
            key: key.clone(),
            cells: row_cells,
            total,
        });
    }

    let date_totals: Vec<StatusCounts> = (0..dates.len())
        .map(|idx| rows.iter().map(|r| r.cells[idx]).sum())
        .collect();
    let grand_total: StatusCounts = date_totals.iter().cloned().sum();

    let counted: Count = cells.values().cloned().sum();
    // Invariant: every record ends up in exactly one cell.
    debug_assert_eq!(
        counted.0,
        records.len() as u64,
        "aggregate: lost records while counting"
    );
    debug_assert_eq!(grand_total.total(), counted.0);
    debug!("aggregate: counted {} records", counted.0);

    OutputMatrix {
        dates,
        rows,
        date_totals,
        grand_total,
    }
}

fn count_cells(records: &[NormalizedRecord]) -> CountCells {
    let mut cells: CountCells = HashMap::new();
    for r in records.iter() {
        let e = cells
            .entry((r.date, r.key.clone(), r.status))
            .or_insert(Count::EMPTY);
        *e += Count(1);
    }
    cells
}

impl OutputMatrix {
    /// The display labels of the date columns, in matrix order.
    pub fn date_headers(&self, style: DateHeaderStyle) -> Vec<String> {
        self.dates.iter().map(|d| format_header(d, style)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if the groups include a village.
    pub fn has_village(&self) -> bool {
        self.rows.iter().any(|r| r.key.village.is_some())
    }

    /// True if at least one record has an unknown consent status.
    pub fn has_unknown_consent(&self) -> bool {
        self.grand_total.unknown > 0
    }

    /// Checks that all the totals reconcile with the cells.
    pub fn totals_reconcile(&self) -> bool {
        let rows_ok = self.rows.iter().all(|r| {
            r.cells.len() == self.dates.len()
                && r.cells.iter().cloned().sum::<StatusCounts>() == r.total
        });
        let columns_ok = self.date_totals.len() == self.dates.len()
            && self.date_totals.iter().enumerate().all(|(idx, dt)| {
                self.rows.iter().map(|r| r.cells[idx]).sum::<StatusCounts>() == *dt
            });
        let grand_ok = self.date_totals.iter().cloned().sum::<StatusCounts>() == self.grand_total
            && self.rows.iter().map(|r| r.total).sum::<StatusCounts>() == self.grand_total;
        rows_ok && columns_ok && grand_ok
    }
}
