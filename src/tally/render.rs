// Rendering of the count sheet: Excel workbook, CSV and JSON summary.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::str::FromStr;

use daily_counts::{
    ConsentStatus, DateHeaderStyle, GroupKey, OutputMatrix, StatusCounts, TallyOutcome,
};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::tally::{io_common::simplify_file_name, *};

/// How the matrix is laid out on the sheet.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum Layout {
    /// One row per group, one block of columns (Yes, No, Total) per date.
    #[default]
    Wide,
    /// One row per group and consent status, one column per date.
    Stacked,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wide" => Ok(Layout::Wide),
            "stacked" | "long" => Ok(Layout::Stacked),
            x => Err(format!("{:?} (expected wide or stacked)", x)),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RenderOptions {
    pub header_style: DateHeaderStyle,
    pub layout: Layout,
    pub sheet_name: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    /// CSV on the standard output.
    Stdout,
    /// The format follows the extension: xlsx, csv or json.
    File(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

fn output_format(path: &str) -> TallyResult<OutputFormat> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("xlsx") => Ok(OutputFormat::Xlsx),
        Some("csv") => Ok(OutputFormat::Csv),
        Some("json") => Ok(OutputFormat::Json),
        _ => InvalidOptionSnafu {
            option: "output",
            message: format!("{:?} should end with .xlsx, .csv or .json", path),
        }
        .fail(),
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum GridCell {
    Text(String),
    Count(u64),
    Blank,
}

/// The matrix flattened into rows and columns, ready to be written.
#[derive(PartialEq, Debug, Clone)]
pub struct Grid {
    /// Labels spanning several columns above the header: (first column, last column, label).
    pub groups: Vec<(usize, usize, String)>,
    pub header: Vec<String>,
    pub body: Vec<Vec<GridCell>>,
    /// Number of leading label columns (enumerator, village, status).
    pub key_columns: usize,
    /// Number of total rows at the end of the body.
    pub total_rows: usize,
}

impl Grid {
    /// The header as a single row, each spanned label prefixed to its columns.
    pub fn flat_header(&self, joiner: &str) -> Vec<String> {
        self.header
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let group = self
                    .groups
                    .iter()
                    .find(|(first, last, _)| *first <= col && col <= *last);
                match group {
                    Some((_, _, label)) => format!("{}{}{}", label, joiner, name),
                    None => name.clone(),
                }
            })
            .collect()
    }
}

// The Unknown consent column only shows up when there is something to put in it.
fn statuses(matrix: &OutputMatrix) -> Vec<ConsentStatus> {
    ConsentStatus::ALL
        .iter()
        .cloned()
        .filter(|s| *s != ConsentStatus::Unknown || matrix.has_unknown_consent())
        .collect()
}

fn key_header(with_village: bool) -> Vec<String> {
    let mut res = vec!["Enumerator".to_string()];
    if with_village {
        res.push("Village".to_string());
    }
    res
}

fn key_cells(key: &GroupKey, with_village: bool) -> Vec<GridCell> {
    let mut res = vec![GridCell::Text(key.enumerator.clone())];
    if with_village {
        let v = key.village.clone().unwrap_or_default();
        res.push(GridCell::Text(v));
    }
    res
}

fn total_cells(with_village: bool) -> Vec<GridCell> {
    let mut res = vec![GridCell::Text("Total".to_string())];
    if with_village {
        res.push(GridCell::Blank);
    }
    res
}

pub fn build_grid(matrix: &OutputMatrix, opts: &RenderOptions) -> Grid {
    match opts.layout {
        Layout::Wide => wide_grid(matrix, opts.header_style),
        Layout::Stacked => stacked_grid(matrix, opts.header_style),
    }
}

fn wide_grid(matrix: &OutputMatrix, style: DateHeaderStyle) -> Grid {
    let with_village = matrix.has_village();
    let statuses = statuses(matrix);
    let block = |sc: &StatusCounts| -> Vec<GridCell> {
        let mut res: Vec<GridCell> = statuses.iter().map(|s| GridCell::Count(sc.get(*s))).collect();
        res.push(GridCell::Count(sc.total()));
        res
    };

    let mut header = key_header(with_village);
    let key_columns = header.len();
    let block_width = statuses.len() + 1;
    let mut block_labels = matrix.date_headers(style);
    block_labels.push("Total".to_string());

    let mut groups = Vec::new();
    for (idx, label) in block_labels.into_iter().enumerate() {
        let first = key_columns + idx * block_width;
        groups.push((first, first + block_width - 1, label));
        header.extend(statuses.iter().map(|s| s.label().to_string()));
        header.push("Total".to_string());
    }

    let mut body: Vec<Vec<GridCell>> = Vec::new();
    for row in matrix.rows.iter() {
        let mut cells = key_cells(&row.key, with_village);
        for sc in row.cells.iter() {
            cells.extend(block(sc));
        }
        cells.extend(block(&row.total));
        body.push(cells);
    }
    let mut cells = total_cells(with_village);
    for sc in matrix.date_totals.iter() {
        cells.extend(block(sc));
    }
    cells.extend(block(&matrix.grand_total));
    body.push(cells);

    Grid {
        groups,
        header,
        body,
        key_columns,
        total_rows: 1,
    }
}

fn stacked_grid(matrix: &OutputMatrix, style: DateHeaderStyle) -> Grid {
    let with_village = matrix.has_village();
    let statuses = statuses(matrix);

    let mut header = key_header(with_village);
    header.push("Consent_Status".to_string());
    let key_columns = header.len();
    header.extend(matrix.date_headers(style));
    header.push("Total".to_string());

    let mut body: Vec<Vec<GridCell>> = Vec::new();
    for row in matrix.rows.iter() {
        for s in statuses.iter() {
            let mut cells = key_cells(&row.key, with_village);
            cells.push(GridCell::Text(s.label().to_string()));
            cells.extend(row.cells.iter().map(|sc| GridCell::Count(sc.get(*s))));
            cells.push(GridCell::Count(row.total.get(*s)));
            body.push(cells);
        }
    }
    for s in statuses.iter() {
        let mut cells = total_cells(with_village);
        cells.push(GridCell::Text(s.label().to_string()));
        cells.extend(matrix.date_totals.iter().map(|sc| GridCell::Count(sc.get(*s))));
        cells.push(GridCell::Count(matrix.grand_total.get(*s)));
        body.push(cells);
    }
    let mut cells = total_cells(with_village);
    cells.push(GridCell::Text("All".to_string()));
    cells.extend(matrix.date_totals.iter().map(|sc| GridCell::Count(sc.total())));
    cells.push(GridCell::Count(matrix.grand_total.total()));
    body.push(cells);

    Grid {
        groups: vec![],
        header,
        body,
        key_columns,
        total_rows: statuses.len() + 1,
    }
}

pub fn write_output(
    outcome: &TallyOutcome,
    opts: &RenderOptions,
    target: &OutputTarget,
) -> TallyResult<()> {
    let grid = build_grid(&outcome.matrix, opts);
    let joiner = header_joiner(opts.header_style);
    match target {
        OutputTarget::Stdout => write_csv(&grid, joiner, io::stdout().lock()),
        OutputTarget::File(path) => {
            match output_format(path)? {
                OutputFormat::Xlsx => write_xlsx(&grid, path, &opts.sheet_name)?,
                OutputFormat::Csv => {
                    let f = File::create(path).context(WritingFileSnafu { path })?;
                    write_csv(&grid, joiner, f)?
                }
                OutputFormat::Json => {
                    let js = build_summary_js(outcome, opts.header_style);
                    let pretty = serde_json::to_string_pretty(&js)
                        .context(ParsingJsonSnafu { path })?;
                    fs::write(path, pretty).context(WritingFileSnafu { path })?
                }
            }
            info!("Count sheet written to {}", simplify_file_name(path));
            Ok(())
        }
    }
}

// Spreadsheet-safe headers stay free of spaces once flattened.
fn header_joiner(style: DateHeaderStyle) -> &'static str {
    match style {
        DateHeaderStyle::Safe => "_",
        _ => " ",
    }
}

pub fn write_csv<W: io::Write>(grid: &Grid, joiner: &str, w: W) -> TallyResult<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(grid.flat_header(joiner))
        .context(WritingCsvSnafu {})?;
    for cells in grid.body.iter() {
        let record: Vec<String> = cells
            .iter()
            .map(|c| match c {
                GridCell::Text(s) => s.clone(),
                GridCell::Count(n) => n.to_string(),
                GridCell::Blank => String::new(),
            })
            .collect();
        wtr.write_record(&record).context(WritingCsvSnafu {})?;
    }
    wtr.flush().context(WritingFileSnafu { path: "CSV output" })?;
    Ok(())
}

struct SheetFormats {
    header: Format,
    text: Format,
    count: Format,
    total_text: Format,
    total_count: Format,
}

impl SheetFormats {
    fn new() -> SheetFormats {
        SheetFormats {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0x4472C4)
                .set_font_color(0xFFFFFF)
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            count: Format::new()
                .set_num_format("#,##0")
                .set_border(FormatBorder::Thin),
            total_text: Format::new()
                .set_bold()
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin),
            total_count: Format::new()
                .set_bold()
                .set_num_format("#,##0")
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin),
        }
    }
}

/// Number of columns of a worksheet.
pub const MAX_XLSX_COLUMNS: usize = 16_384;

pub fn write_xlsx(grid: &Grid, path: &str, sheet_name: &str) -> TallyResult<()> {
    let columns = grid.header.len();
    let width = u16::try_from(columns)
        .ok()
        .filter(|w| usize::from(*w) <= MAX_XLSX_COLUMNS)
        .context(TooWideSnafu { columns, path })?;
    debug!("write_xlsx: {} columns, {} rows", width, grid.body.len());
    let mut workbook = Workbook::new();
    let formats = SheetFormats::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(sheet_name)
        .context(WritingExcelSnafu { path })?;
    fill_sheet(sheet, grid, &formats).context(WritingExcelSnafu { path })?;
    workbook.save(path).context(WritingExcelSnafu { path })?;
    Ok(())
}

// Callers check the width first, so every column index fits.
fn col_num(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

fn fill_sheet(sheet: &mut Worksheet, grid: &Grid, f: &SheetFormats) -> Result<(), XlsxError> {
    let header_rows: u32 = if grid.groups.is_empty() {
        for (col, name) in grid.header.iter().enumerate() {
            sheet.write_with_format(0, col_num(col), name.as_str(), &f.header)?;
        }
        1
    } else {
        for (col, name) in grid.header.iter().enumerate() {
            let c = col_num(col);
            if col < grid.key_columns {
                sheet.merge_range(0, c, 1, c, name.as_str(), &f.header)?;
            } else {
                sheet.write_with_format(1, c, name.as_str(), &f.header)?;
            }
        }
        for (first, last, label) in grid.groups.iter() {
            if first == last {
                sheet.write_with_format(0, col_num(*first), label.as_str(), &f.header)?;
            } else {
                sheet.merge_range(
                    0,
                    col_num(*first),
                    0,
                    col_num(*last),
                    label.as_str(),
                    &f.header,
                )?;
            }
        }
        2
    };

    let first_total = grid.body.len().saturating_sub(grid.total_rows);
    for (idx, cells) in grid.body.iter().enumerate() {
        let row = header_rows + idx as u32;
        let (text, count) = if idx >= first_total {
            (&f.total_text, &f.total_count)
        } else {
            (&f.text, &f.count)
        };
        for (col, cell) in cells.iter().enumerate() {
            let col = col_num(col);
            match cell {
                GridCell::Text(s) => sheet.write_with_format(row, col, s.as_str(), text)?,
                GridCell::Count(n) => sheet.write_with_format(row, col, *n as f64, count)?,
                GridCell::Blank => sheet.write_blank(row, col, text)?,
            };
        }
    }

    for col in 0..grid.key_columns {
        sheet.set_column_width(col_num(col), 20)?;
    }
    sheet.set_freeze_panes(header_rows, col_num(grid.key_columns))?;
    Ok(())
}

// ********* JSON summary **********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CountsJS {
    pub yes: u64,
    pub no: u64,
    pub unknown: u64,
    pub total: u64,
}

impl From<&StatusCounts> for CountsJS {
    fn from(sc: &StatusCounts) -> Self {
        CountsJS {
            yes: sc.yes,
            no: sc.no,
            unknown: sc.unknown,
            total: sc.total(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DateCountsJS {
    pub date: String,
    #[serde(flatten)]
    pub counts: CountsJS,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RowJS {
    pub enumerator: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub village: Option<String>,
    pub dates: Vec<DateCountsJS>,
    pub total: CountsJS,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RenamedJS {
    pub position: usize,
    pub original: String,
    pub renamed: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryJS {
    pub records: u64,
    #[serde(rename = "headerStyle")]
    pub header_style: String,
    pub dates: Vec<String>,
    pub rows: Vec<RowJS>,
    #[serde(rename = "dateTotals")]
    pub date_totals: Vec<DateCountsJS>,
    #[serde(rename = "grandTotal")]
    pub grand_total: CountsJS,
    pub warnings: BTreeMap<String, u64>,
    #[serde(rename = "renamedColumns")]
    pub renamed_columns: Vec<RenamedJS>,
}

pub fn build_summary_js(outcome: &TallyOutcome, style: DateHeaderStyle) -> SummaryJS {
    let m = &outcome.matrix;
    let dates = m.date_headers(style);
    let dated = |cells: &[StatusCounts]| -> Vec<DateCountsJS> {
        dates
            .iter()
            .zip(cells.iter())
            .map(|(d, sc)| DateCountsJS {
                date: d.clone(),
                counts: sc.into(),
            })
            .collect()
    };
    SummaryJS {
        records: outcome.num_records,
        header_style: style.to_string(),
        dates: dates.clone(),
        rows: m
            .rows
            .iter()
            .map(|r| RowJS {
                enumerator: r.key.enumerator.clone(),
                village: r.key.village.clone(),
                dates: dated(r.cells.as_slice()),
                total: (&r.total).into(),
            })
            .collect(),
        date_totals: dated(m.date_totals.as_slice()),
        grand_total: (&m.grand_total).into(),
        warnings: outcome
            .report
            .counts
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(k, c)| (k.to_string(), *c))
            .collect(),
        renamed_columns: outcome
            .report
            .renamed_columns
            .iter()
            .map(|r| RenamedJS {
                position: r.position,
                original: r.original.clone(),
                renamed: r.renamed.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, DataType, Reader};
    use daily_counts::{run_tally, RawTable, RawValue, TallySettings};

    fn outcome(rows: &[(&str, &str, &str)], village: bool) -> TallyOutcome {
        let mut columns = vec!["enum".to_string(), "consent".to_string(), "int_date".to_string()];
        if village {
            columns.push("village".to_string());
        }
        let table = RawTable {
            columns,
            rows: rows
                .iter()
                .enumerate()
                .map(|(idx, (e, c, d))| {
                    let mut r = vec![RawValue::from(*e), RawValue::from(*c), RawValue::from(*d)];
                    if village {
                        r.push(RawValue::from(if idx % 2 == 0 { "North" } else { "South" }));
                    }
                    r
                })
                .collect(),
            ..Default::default()
        };
        let mut settings = TallySettings::default();
        settings.mapping.fill_defaults(&table.columns);
        if village {
            settings.mapping.village = Some("village".to_string());
        }
        run_tally(&table, &settings).unwrap()
    }

    fn two_days() -> TallyOutcome {
        outcome(
            &[
                ("A", "Yes", "2024-03-07"),
                ("A", "No", "2024-03-07"),
                ("B", "1", "2024-03-08"),
            ],
            false,
        )
    }

    fn opts(layout: Layout, header_style: DateHeaderStyle) -> RenderOptions {
        RenderOptions {
            header_style,
            layout,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }

    fn counts(xs: &[u64]) -> Vec<GridCell> {
        xs.iter().map(|x| GridCell::Count(*x)).collect()
    }

    fn text(s: &str) -> GridCell {
        GridCell::Text(s.to_string())
    }

    #[test]
    fn wide_layout() {
        let grid = build_grid(
            &two_days().matrix,
            &opts(Layout::Wide, DateHeaderStyle::Pretty),
        );
        assert_eq!(
            grid.groups,
            vec![
                (1, 3, "Mar 7, 2024".to_string()),
                (4, 6, "Mar 8, 2024".to_string()),
                (7, 9, "Total".to_string())
            ]
        );
        assert_eq!(grid.header.len(), 10);
        assert_eq!(grid.header[0], "Enumerator");
        assert_eq!(&grid.header[1..4], &["Yes", "No", "Total"]);
        assert_eq!(grid.body.len(), 3);

        let mut a = vec![text("A")];
        a.extend(counts(&[1, 1, 2, 0, 0, 0, 1, 1, 2]));
        assert_eq!(grid.body[0], a);
        let mut total = vec![text("Total")];
        total.extend(counts(&[1, 1, 2, 1, 0, 1, 2, 1, 3]));
        assert_eq!(grid.body[2], total);
        assert_eq!(grid.flat_header(" ")[1], "Mar 7, 2024 Yes");
    }

    #[test]
    fn unknown_column_when_needed() {
        let o = outcome(&[("A", "maybe", "2024-03-07"), ("A", "Yes", "")], false);
        let grid = build_grid(&o.matrix, &opts(Layout::Wide, DateHeaderStyle::Iso));
        assert_eq!(&grid.header[1..5], &["Yes", "No", "Unknown", "Total"]);
        assert_eq!(grid.groups[1].2, "Unknown");
        let mut total = vec![text("Total")];
        total.extend(counts(&[0, 0, 1, 1, 1, 0, 0, 1, 1, 0, 1, 2]));
        assert_eq!(grid.body[1], total);
    }

    #[test]
    fn stacked_layout() {
        let grid = build_grid(
            &two_days().matrix,
            &opts(Layout::Stacked, DateHeaderStyle::Compact),
        );
        assert!(grid.groups.is_empty());
        assert_eq!(
            grid.header,
            vec!["Enumerator", "Consent_Status", "03/07/24", "03/08/24", "Total"]
        );
        assert_eq!(grid.total_rows, 3);
        let rows: Vec<Vec<GridCell>> = vec![
            vec![text("A"), text("Yes"), GridCell::Count(1), GridCell::Count(0), GridCell::Count(1)],
            vec![text("A"), text("No"), GridCell::Count(1), GridCell::Count(0), GridCell::Count(1)],
            vec![text("B"), text("Yes"), GridCell::Count(0), GridCell::Count(1), GridCell::Count(1)],
            vec![text("B"), text("No"), GridCell::Count(0), GridCell::Count(0), GridCell::Count(0)],
            vec![text("Total"), text("Yes"), GridCell::Count(1), GridCell::Count(1), GridCell::Count(2)],
            vec![text("Total"), text("No"), GridCell::Count(1), GridCell::Count(0), GridCell::Count(1)],
            vec![text("Total"), text("All"), GridCell::Count(2), GridCell::Count(1), GridCell::Count(3)],
        ];
        assert_eq!(grid.body, rows);
    }

    #[test]
    fn village_columns() {
        let o = outcome(
            &[("A", "Yes", "2024-03-07"), ("A", "No", "2024-03-07")],
            true,
        );
        let grid = build_grid(&o.matrix, &opts(Layout::Wide, DateHeaderStyle::Safe));
        assert_eq!(grid.key_columns, 2);
        assert_eq!(&grid.header[0..2], &["Enumerator", "Village"]);
        assert_eq!(grid.body[0][1], text("North"));
        assert_eq!(grid.body[1][1], text("South"));
        assert_eq!(grid.body[2][1], GridCell::Blank);
        assert_eq!(grid.flat_header("_")[2], "Mar_7_2024_Yes");
    }

    #[test]
    fn csv_output() {
        let grid = build_grid(
            &two_days().matrix,
            &opts(Layout::Wide, DateHeaderStyle::Iso),
        );
        let mut buf: Vec<u8> = Vec::new();
        write_csv(&grid, " ", &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Enumerator,2024-03-07 Yes,2024-03-07 No,2024-03-07 Total,\
             2024-03-08 Yes,2024-03-08 No,2024-03-08 Total,Total Yes,Total No,Total Total"
        );
        assert_eq!(lines[1], "A,1,1,2,0,0,0,1,1,2");
        assert_eq!(lines[3], "Total,1,1,2,1,0,1,2,1,3");
    }

    #[test]
    fn xlsx_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.xlsx").display().to_string();
        let o = two_days();
        write_output(
            &o,
            &opts(Layout::Wide, DateHeaderStyle::Pretty),
            &OutputTarget::File(path.clone()),
        )
        .unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook
            .worksheet_range(DEFAULT_SHEET_NAME)
            .unwrap()
            .unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&DataType::String("Enumerator".to_string()))
        );
        assert_eq!(
            range.get_value((0, 1)),
            Some(&DataType::String("Mar 7, 2024".to_string()))
        );
        assert_eq!(
            range.get_value((1, 2)),
            Some(&DataType::String("No".to_string()))
        );
        assert_eq!(
            range.get_value((4, 0)),
            Some(&DataType::String("Total".to_string()))
        );
        assert_eq!(range.get_value((4, 9)), Some(&DataType::Float(3.0)));
    }

    #[test]
    fn empty_input() {
        let o = outcome(&[], false);
        let grid = build_grid(&o.matrix, &opts(Layout::Wide, DateHeaderStyle::Pretty));
        assert_eq!(grid.header, vec!["Enumerator", "Yes", "No", "Total"]);
        assert_eq!(grid.body, vec![vec![text("Total"), GridCell::Count(0), GridCell::Count(0), GridCell::Count(0)]]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx").display().to_string();
        write_xlsx(&grid, &path, "Daily").unwrap();
        assert!(std::path::Path::new(&path).exists());
    }

    #[test]
    fn bad_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.pdf").display().to_string();
        let res = write_output(
            &two_days(),
            &opts(Layout::Wide, DateHeaderStyle::Pretty),
            &OutputTarget::File(path),
        );
        assert!(matches!(res, Err(TallyCliError::InvalidOption { .. })));

        let grid = build_grid(&two_days().matrix, &opts(Layout::Wide, DateHeaderStyle::Pretty));
        let path = dir.path().join("counts.xlsx").display().to_string();
        let res = write_xlsx(&grid, &path, "no [brackets]");
        assert!(matches!(res, Err(TallyCliError::WritingExcel { .. })));
    }

    #[test]
    fn too_many_columns_for_a_worksheet() {
        // 6000 dates with Yes, No, Total each: wider than a worksheet.
        let grid = Grid {
            groups: vec![(1, 18_000, "Mar 7, 2024".to_string())],
            header: (0..18_001).map(|i| format!("c{}", i)).collect(),
            body: vec![],
            key_columns: 1,
            total_rows: 0,
        };
        assert_eq!(grid.flat_header(" ")[18_000], "Mar 7, 2024 c18000");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.xlsx").display().to_string();
        let res = write_xlsx(&grid, &path, DEFAULT_SHEET_NAME);
        assert!(matches!(
            res,
            Err(TallyCliError::TooWide { columns: 18_001, .. })
        ));
        assert!(!std::path::Path::new(&path).exists());

        // CSV has no such limit.
        let mut buf: Vec<u8> = Vec::new();
        write_csv(&grid, " ", &mut buf).unwrap();
        assert!(!buf.is_empty());
    }

    #[test]
    fn summary() {
        let js = build_summary_js(&two_days(), DateHeaderStyle::Iso);
        assert_eq!(js.records, 3);
        assert_eq!(js.header_style, "iso");
        assert_eq!(js.dates, vec!["2024-03-07", "2024-03-08"]);
        assert_eq!(js.rows[1].enumerator, "B");
        assert_eq!(js.rows[1].dates[1].counts.yes, 1);
        assert_eq!(js.grand_total.total, 3);
        assert!(js.warnings.is_empty());

        let v = serde_json::to_value(&js).unwrap();
        assert_eq!(v["dateTotals"][0]["date"], "2024-03-07");
        assert_eq!(v["dateTotals"][0]["total"], 2);
        assert!(v["rows"][0].get("village").is_none());
    }
}
