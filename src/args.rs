use clap::Parser;

/// This is a daily survey productivity program: it counts the interviews of every enumerator,
/// for every field date, split by consent.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A configuration file in JSON format. Every option below may also be
    /// set in this file, see the manual for its layout. Options passed on the command line take
    /// precedence over the configuration file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, enumtally will check that the
    /// computed summary matches the reference and print the differences otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or 'stdout') Where to write the count sheet. The format follows the extension:
    /// .xlsx (default), .csv or .json. 'stdout' prints the sheet as CSV.
    /// Default: daily_survey_productivity_<today>.xlsx
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) If specified, a JSON summary of the counts and of the data quality
    /// warnings is also written to this location.
    #[clap(long, value_parser)]
    pub summary_out: Option<String>,

    /// (file path) The survey data.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv, excel or json) The type of the input. Inferred from the file extension if missing.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) A JSON file of value labels: {"column": {"code": "label"}}.
    #[clap(long, value_parser)]
    pub labels: Option<String>,

    /// (default 'consent') The column with the consent (1/0, yes/no, ...).
    #[clap(long, value_parser)]
    pub consent_column: Option<String>,

    /// (default 'enum') The column with the enumerator (for example enum or enum_lab).
    #[clap(long, value_parser)]
    pub enumerator_column: Option<String>,

    /// (optional) The column with the village. If specified, counts are split by village as well.
    #[clap(long, value_parser)]
    pub village_column: Option<String>,

    /// (default 'int_date') The column with the field date.
    #[clap(long, value_parser)]
    pub date_column: Option<String>,

    /// (pretty, safe, compact or iso; default pretty) The style of the date headers.
    #[clap(long, value_parser)]
    pub header_style: Option<String>,

    /// (wide or stacked; default wide) 'wide' has one row per enumerator with Yes/No/Total
    /// sub-columns for every date. 'stacked' has one row per enumerator and consent status.
    #[clap(long, value_parser)]
    pub layout: Option<String>,

    /// (spreadsheet or statistical; default spreadsheet) How numeric dates are read: days since
    /// 1899-12-30 (spreadsheet) or since 1960-01-01 (statistical packages).
    #[clap(long, value_parser)]
    pub serial_epoch: Option<String>,

    /// (default Daily_survey_by_enum) The name of the worksheet in the Excel output.
    #[clap(long, value_parser)]
    pub sheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
