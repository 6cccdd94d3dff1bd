use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use xlsutils_core::{
    ColumnSelection, ConversionSummary, ConvertError, ConvertOptions, Converter, ConverterConfig,
    Delimiter, StdoutReporter,
};
use xlsutils_logging::{LogLevel, LogSettings};

const AFTER_HELP: &str = "\
This tool expects the input workbook to be a well-formed 'CSV-like'
workbook. The first sheet of the workbook is converted into a new
delimited file. The columns can be chosen through parameters, as well as
the delimiter. If no specific columns are chosen, all columns are used.

Example:
  $ xls2csv input.xls output.csv -c \"A,B,Z,AA,AF,AZ\" -d \"|\"
  - Converts input.xls into output.csv, using only data from the columns
    A, B, Z, AA, AF and AZ. The output is delimited by the \"|\" symbol.";

#[derive(Parser)]
#[command(name = "xls2csv")]
#[command(about = "Converts the first sheet of a XLS/XLSX/ODS file to CSV", long_about = None)]
#[command(after_help = AFTER_HELP)]
#[command(version)]
struct Cli {
    /// List of columns (letters separated by commas) to obtain from the
    /// workbook. If not specified, all columns will be used.
    #[arg(short, long, value_name = "COLUMNS")]
    columns: Option<String>,

    /// Delimiter (comma, semicolon, pipe, \t ...)
    #[arg(short, long, value_name = "DELIMITER")]
    delimiter: Delimiter,

    /// Logging level (DEBUG, INFO or ERROR). If not set, defaults to ERROR.
    #[arg(short, long, value_name = "LEVEL")]
    loglevel: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Input workbook
    #[arg(value_name = "INFILE")]
    infile: PathBuf,

    /// Output delimited file
    #[arg(value_name = "OUTFILE")]
    outfile: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let level = cli.log_level();
    if let Some(line) = banner_line(level) {
        println!("{}", line);
    }
    let settings = LogSettings::new(level, "XLS2CSV_LOG");

    let code = tracing::subscriber::with_default(settings.subscriber(), || execute(&cli));
    std::process::exit(code);
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        self.loglevel
            .as_deref()
            .map(LogLevel::from_name)
            .unwrap_or_default()
    }
}

fn banner_line(level: LogLevel) -> Option<String> {
    level.banner().map(|label| format!("> Log level: {}", label))
}

/// Run the conversion and report the outcome; returns the process exit code
fn execute(cli: &Cli) -> i32 {
    match run(cli) {
        Ok(summary) => {
            println!(
                "{} {} rows from sheet '{}' written to {}",
                "✓".green().bold(),
                summary.rows_written,
                summary.sheet_name,
                cli.outfile.display()
            );
            0
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            exit_code(&err)
        }
    }
}

/// 2 when the workbook could not be opened, 1 for every other failure
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ConvertError>()
        .map_or(1, ConvertError::exit_code)
}

fn run(cli: &Cli) -> Result<ConversionSummary> {
    let config = ConverterConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let options = ConvertOptions {
        columns: ColumnSelection::parse(cli.columns.as_deref(), config.column_policy())?,
        delimiter: cli.delimiter,
        line_ending: config.line_ending(),
        duplicate_headers: config.convert.duplicate_headers,
    };

    let converter = Converter::new(options);
    let summary = converter.convert(&cli.infile, &cli.outfile, &mut StdoutReporter)?;
    Ok(summary)
}
