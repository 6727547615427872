use log::{debug, info, warn};

use daily_counts::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::io_common::*;
use crate::tally::render::{Layout, OutputTarget, RenderOptions};

pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;
pub mod render;

#[derive(Debug, Snafu)]
pub enum TallyCliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the Excel file {path}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display(
        "The count sheet has {columns} columns, more than a worksheet holds: write {path} as .csv or use --layout stacked"
    ))]
    TooWide { columns: usize, path: String },
    #[snafu(display("Error writing the CSV output"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot map the columns of the survey"))]
    Mapping { source: TallyErrors },
    #[snafu(display("No input file: use --input or set input.filePath in the configuration"))]
    MissingInput {},
    #[snafu(display("Invalid value for {option}: {message}"))]
    InvalidOption { option: String, message: String },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyCliError>;

// ********* Configuration file **********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "labelsPath")]
    pub labels_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnSettings {
    pub consent: Option<String>,
    pub enumerator: Option<String>,
    pub village: Option<String>,
    #[serde(rename = "fieldDate")]
    pub field_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "headerStyle")]
    pub header_style: Option<String>,
    pub layout: Option<String>,
    #[serde(rename = "sheetName")]
    pub sheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct TallyConfig {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub columns: ColumnSettings,
    #[serde(rename = "serialEpoch")]
    pub serial_epoch: Option<String>,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Everything needed for one run, after merging the command line over the configuration file.
#[derive(PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub input_path: String,
    pub provider: Provider,
    pub excel_worksheet_name: Option<String>,
    pub labels_path: Option<String>,
    pub tally: TallySettings,
    pub render: RenderOptions,
    pub target: OutputTarget,
    pub summary_path: Option<String>,
    pub reference_path: Option<String>,
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: TallyConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

// Paths from the configuration file are relative to the file itself.
fn config_path(root: &Path, p: &Option<String>) -> Option<String> {
    p.as_ref().map(|s| {
        let pb: PathBuf = [root, Path::new(s)].iter().collect();
        pb.as_path().display().to_string()
    })
}

pub fn resolve_settings(args: &Args) -> TallyResult<RunSettings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .map(|x| x.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (TallyConfig::default(), PathBuf::new()),
    };

    let input_path = args
        .input
        .clone()
        .or_else(|| config_path(&root, &config.input.file_path))
        .context(MissingInputSnafu {})?;

    let provider = match args.input_type.clone().or(config.input.provider.clone()) {
        Some(s) => parse_option("input type", &s)?,
        None => infer_provider(&input_path).context(InvalidOptionSnafu {
            option: "input type",
            message: format!(
                "cannot infer the type of {:?} from its extension, use --input-type",
                input_path
            ),
        })?,
    };

    let mapping = ColumnMapping {
        consent: args
            .consent_column
            .clone()
            .or(config.columns.consent.clone()),
        enumerator: args
            .enumerator_column
            .clone()
            .or(config.columns.enumerator.clone()),
        village: args
            .village_column
            .clone()
            .or(config.columns.village.clone()),
        field_date: args
            .date_column
            .clone()
            .or(config.columns.field_date.clone()),
    };

    let serial_epoch = match args.serial_epoch.clone().or(config.serial_epoch.clone()) {
        Some(s) => parse_serial_epoch(&s)?,
        None => SerialEpoch::Spreadsheet,
    };

    let header_style: DateHeaderStyle = match args
        .header_style
        .clone()
        .or(config.output.header_style.clone())
    {
        Some(s) => parse_option("header style", &s)?,
        None => DateHeaderStyle::Pretty,
    };

    let layout: Layout = match args.layout.clone().or(config.output.layout.clone()) {
        Some(s) => parse_option("layout", &s)?,
        None => Layout::Wide,
    };

    let target = match args
        .out
        .clone()
        .or_else(|| config_path(&root, &config.output.file_path))
    {
        Some(s) if s == "stdout" => OutputTarget::Stdout,
        Some(s) => OutputTarget::File(s),
        None => OutputTarget::File(default_output_name()),
    };

    let res = RunSettings {
        input_path,
        provider,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or(config.input.excel_worksheet_name.clone()),
        labels_path: args
            .labels
            .clone()
            .or_else(|| config_path(&root, &config.input.labels_path)),
        tally: TallySettings {
            mapping,
            serial_epoch,
        },
        render: RenderOptions {
            header_style,
            layout,
            sheet_name: args
                .sheet_name
                .clone()
                .or(config.output.sheet_name.clone())
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
        },
        target,
        summary_path: args
            .summary_out
            .clone()
            .or_else(|| config_path(&root, &config.output.summary_path)),
        reference_path: args.reference.clone(),
    };
    debug!("resolve_settings: {:?}", res);
    Ok(res)
}

fn parse_option<T: std::str::FromStr<Err = String>>(option: &str, s: &str) -> TallyResult<T> {
    s.parse::<T>()
        .map_err(|message| TallyCliError::InvalidOption {
            option: option.to_string(),
            message,
        })
}

fn parse_serial_epoch(s: &str) -> TallyResult<SerialEpoch> {
    match s.trim().to_lowercase().as_str() {
        "spreadsheet" | "excel" => Ok(SerialEpoch::Spreadsheet),
        "statistical" | "stata" => Ok(SerialEpoch::Statistical),
        x => InvalidOptionSnafu {
            option: "serial epoch",
            message: format!("{:?} (expected spreadsheet or statistical)", x),
        }
        .fail(),
    }
}

pub fn read_table(settings: &RunSettings) -> TallyResult<RawTable> {
    let path = settings.input_path.as_str();
    info!("Attempting to read survey file {:?}", path);
    let mut table = match settings.provider {
        Provider::Csv => io_csv::read_csv_table(path)?,
        Provider::Excel => {
            io_excel::read_excel_table(path, settings.excel_worksheet_name.as_deref())?
        }
        Provider::Json => io_json::read_json_table(path)?,
    };
    if let Some(labels_path) = &settings.labels_path {
        info!("Attempting to read value labels {:?}", labels_path);
        let labels = io_json::read_labels(labels_path)?;
        merge_labels(&mut table, labels);
    }
    info!(
        "Loaded {} rows and {} columns from {}",
        table.rows.len(),
        table.columns.len(),
        simplify_file_name(path)
    );
    Ok(table)
}

/// Reads, tallies and writes, as described by the settings.
pub fn run_tally_with(settings: &RunSettings) -> TallyResult<TallyOutcome> {
    let table = read_table(settings)?;

    let mut tally_settings = settings.tally.clone();
    let (deduped, _) = dedupe_column_names(&table.columns);
    tally_settings.mapping.fill_defaults(&deduped);
    info!("Column mapping: {:?}", tally_settings.mapping);

    let outcome = match run_tally(&table, &tally_settings) {
        Ok(x) => x,
        Err(e) => {
            warn!("Available columns: {:?}", deduped);
            return Err(e).context(MappingSnafu {});
        }
    };

    for r in outcome.report.renamed_columns.iter() {
        warn!(
            "{} at position {}: {:?} is now {:?}",
            r.kind,
            r.position + 1,
            r.original,
            r.renamed
        );
    }
    info!(
        "Processed! {} records in {} groups over {} dates (consent yes: {}, no: {}, unknown: {})",
        outcome.num_records,
        outcome.matrix.rows.len(),
        outcome.matrix.dates.len(),
        outcome.matrix.grand_total.yes,
        outcome.matrix.grand_total.no,
        outcome.matrix.grand_total.unknown
    );
    if !header::headers_are_unique(&outcome.matrix.dates, settings.render.header_style) {
        warn!(
            "Several dates share the same {} header, use --header-style iso to tell them apart",
            settings.render.header_style
        );
    }
    if !outcome.matrix.totals_reconcile() {
        whatever!("Internal error: the totals of the count sheet do not add up")
    }

    render::write_output(&outcome, &settings.render, &settings.target)?;

    // Going through a JSON value sorts the keys, as for the reference read back from disk.
    let summary_js = serde_json::to_value(render::build_summary_js(
        &outcome,
        settings.render.header_style,
    ))
    .context(ParsingJsonSnafu { path: "summary" })?;
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu { path: "summary" })?;

    if let Some(p) = &settings.summary_path {
        fs::write(p, &pretty_js_summary).context(WritingFileSnafu { path: p })?;
        info!("Summary written to {:?}", p);
    }

    // The reference summary, if provided for comparison
    if let Some(p) = &settings.reference_path {
        let summary_ref = read_summary(p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu { path: p })?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
        info!("The summary matches the reference {:?}", p);
    }

    Ok(outcome)
}

pub fn run(args: &Args) -> TallyResult<()> {
    let settings = resolve_settings(args)?;
    run_tally_with(&settings)?;
    Ok(())
}

pub fn read_summary(path: &str) -> TallyResult<serde_json::Value> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: serde_json::Value =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
