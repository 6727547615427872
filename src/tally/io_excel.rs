// Primitives for reading spreadsheets.

use calamine::{open_workbook_auto, DataType, Range, Reader};
use daily_counts::{dates::serial_to_datetime, identity::canonical_string, RawTable, RawValue, SerialEpoch};

use crate::tally::{
    io_common::{drop_blank_rows, simplify_file_name},
    *,
};

/// Reads the given worksheet, or the first one, of a workbook.
/// The first row holds the column names.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> TallyResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let columns: Vec<String> = match iter.next() {
        Some(header) => header
            .iter()
            .map(|c| canonical_string(&cell_to_raw(c)))
            .collect(),
        None => {
            warn!("read_excel_table: {} has no rows", simplify_file_name(path));
            return Ok(RawTable::default());
        }
    };
    debug!("read_excel_table: header: {:?}", columns);

    let mut rows: Vec<Vec<RawValue>> = iter
        .map(|row| row.iter().map(cell_to_raw).collect())
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
        columns,
        rows,
        ..Default::default()
    })
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> TallyResult<Range<DataType>> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?
    } else {
        debug!("get_range: sheets: {:?}", workbook.sheet_names());
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

/// Date cells are stored as serial numbers on the spreadsheet epoch.
pub fn cell_to_raw(cell: &DataType) -> RawValue {
    match cell {
        DataType::Empty => RawValue::Empty,
        DataType::String(s) if s.trim().is_empty() => RawValue::Empty,
        DataType::String(s) => RawValue::Text(s.clone()),
        DataType::Int(i) => RawValue::Number(*i as f64),
        DataType::Float(f) => RawValue::Number(*f),
        DataType::Bool(b) => RawValue::Bool(*b),
        DataType::DateTime(f) => match serial_to_datetime(*f, SerialEpoch::Spreadsheet) {
            Some(dt) => RawValue::DateTime(dt),
            None => RawValue::Number(*f),
        },
        DataType::Error(e) => RawValue::Text(format!("{:?}", e)),
        #[allow(unreachable_patterns)]
        _ => RawValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn cells() {
        assert_eq!(cell_to_raw(&DataType::Empty), RawValue::Empty);
        assert_eq!(cell_to_raw(&DataType::String(" ".to_string())), RawValue::Empty);
        assert_eq!(cell_to_raw(&DataType::Int(1)), RawValue::Number(1.0));
        assert_eq!(cell_to_raw(&DataType::Bool(true)), RawValue::Bool(true));
        let dt = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(
            cell_to_raw(&DataType::DateTime(45358.5)),
            RawValue::DateTime(dt)
        );
    }

    #[test]
    fn reads_named_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx").display().to_string();
        let mut workbook = Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("notes").unwrap();
        notes.write_string(0, 0, "nothing here").unwrap();
        let sheet = workbook.add_worksheet();
        sheet.set_name("data").unwrap();
        for (col, name) in ["enum", "consent", "int_date"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "A").unwrap();
        sheet.write_number(1, 1, 1.0).unwrap();
        sheet.write_number(1, 2, 45358.0).unwrap();
        sheet.write_string(3, 0, "B").unwrap();
        sheet.write_string(3, 1, "No").unwrap();
        sheet.write_string(3, 2, "03/07/2024").unwrap();
        workbook.save(&path).unwrap();

        let table = read_excel_table(&path, Some("data")).unwrap();
        assert_eq!(table.columns, vec!["enum", "consent", "int_date"]);
        // The blank third row is skipped.
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], RawValue::Number(1.0));
        assert_eq!(table.rows[1][0], RawValue::Text("B".to_string()));

        let first = read_excel_table(&path, None).unwrap();
        assert_eq!(first.columns, vec!["nothing here"]);

        let res = read_excel_table(&path, Some("missing"));
        assert!(matches!(res, Err(TallyCliError::MissingWorksheet { .. })));
    }
}
