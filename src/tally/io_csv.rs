// Primitives for reading CSV files.

use daily_counts::{RawTable, RawValue};

use crate::tally::{
    io_common::{cell_from_text, drop_blank_rows, simplify_file_name},
    *,
};

/// Reads a CSV export. The first line holds the column names.
///
/// Every cell is kept as text: the normalizers decide what the text means.
pub fn read_csv_table(path: &str) -> TallyResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    let mut records = rdr.into_records();

    let columns: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(CsvLineParseSnafu { lineno: 1_usize })?;
            line.iter()
                .enumerate()
                .map(|(idx, s)| {
                    // A byte order mark may precede the first name.
                    let s = if idx == 0 { s.trim_start_matches('\u{feff}') } else { s };
                    s.trim().to_string()
                })
                .collect()
        }
        None => {
            warn!("read_csv_table: {} is empty", simplify_file_name(path));
            return Ok(RawTable::default());
        }
    };
    debug!("read_csv_table: header: {:?}", columns);

    let mut rows: Vec<Vec<RawValue>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The index starts at 1 to respect most conventions in the excel world
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if line.len() != columns.len() {
            debug!(
                "read_csv_table: line {} has {} cells, expected {}",
                lineno,
                line.len(),
                columns.len()
            );
        }
        rows.push(line.iter().map(cell_from_text).collect());
    }
    let dropped = drop_blank_rows(&mut rows);
    if dropped > 0 {
        info!(
            "Skipped {} blank lines in {}",
            dropped,
            simplify_file_name(path)
        );
    }

    Ok(RawTable {
        columns,
        rows,
        ..Default::default()
    })
}
