//! Sift CLI - Command-line interface for Synheart Sift
//!
//! Commands:
//! - inspect: Summarize a raw survey table
//! - prepare: Run the preparation pipeline and write the prepared table
//! - report: Full analysis run (summaries, preparation, chart artifacts)
//! - schema: Print the expected input schema

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_sift::charts::{ChartKind, ChartSet};
use synheart_sift::encoder::ArtifactEncoder;
use synheart_sift::pipeline::{PipelineReport, Prepared, Preparer};
use synheart_sift::summary::TableSummary;
use synheart_sift::types::{
    NumericField, NumericKind, RawCell, RawTable, GAD_7_SEVERITY_COLUMN, PRIMARY_PLATFORM_COLUMN,
    SCREEN_TIME_CATEGORY_COLUMN,
};
use synheart_sift::{SiftConfig, SiftError, TableReader, TableWriter, SIFT_VERSION};

/// Sift - Dataset preparation for screen time and mental health surveys
#[derive(Parser)]
#[command(name = "sift")]
#[command(author = "Synheart AI Inc")]
#[command(version = SIFT_VERSION)]
#[command(about = "Clean survey tables and chart screen time against wellbeing", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a raw survey table
    Inspect {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the preparation pipeline
    Prepare {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        output_format: OutputFormat,

        /// Write the run report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Summarize, prepare, and render the four chart artifacts
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for chart artifacts
        #[arg(long, default_value = "charts")]
        out_dir: PathBuf,
    },

    /// Print the expected input schema
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Delimited text with the derived category column
    Csv,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), SiftCliError> {
    let config = match &cli.config {
        Some(path) => SiftConfig::from_path(path)?,
        None => SiftConfig::default(),
    };

    match cli.command {
        Commands::Inspect { input, json } => cmd_inspect(&input, json, &config),

        Commands::Prepare {
            input,
            output,
            output_format,
            report,
        } => cmd_prepare(&input, &output, output_format, report.as_deref(), &config),

        Commands::Report { input, out_dir } => cmd_report(&input, &out_dir, &config),

        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn read_table(input: &Path, config: &SiftConfig) -> Result<RawTable, SiftCliError> {
    let table = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        TableReader::parse_str(&buffer, config)?
    } else {
        TableReader::from_path(input, config)?
    };
    Ok(table)
}

fn cmd_inspect(input: &Path, json: bool, config: &SiftConfig) -> Result<(), SiftCliError> {
    let table = read_table(input, config)?;
    let summary = TableSummary::of(&table, config.report.head_rows);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&table, &summary);
    }

    Ok(())
}

fn cmd_prepare(
    input: &Path,
    output: &Path,
    output_format: OutputFormat,
    report_path: Option<&Path>,
    config: &SiftConfig,
) -> Result<(), SiftCliError> {
    let table = read_table(input, config)?;
    let Prepared { table: prepared, report } = Preparer::new(config).prepare(&table);

    let output_data = match output_format {
        OutputFormat::Csv => {
            TableWriter::to_csv_string(&prepared.to_raw(), config.delimiter_byte())?
        }
        OutputFormat::Ndjson => {
            let mut lines = String::new();
            for row in TableWriter::to_json_rows(&prepared) {
                lines.push_str(&serde_json::to_string(&row)?);
                lines.push('\n');
            }
            lines
        }
        OutputFormat::Json => serde_json::to_string(&TableWriter::to_json_rows(&prepared))?,
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(&TableWriter::to_json_rows(&prepared))?
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    if let Some(path) = report_path {
        let json = ArtifactEncoder::new().encode_report(&report)?;
        fs::write(path, json)?;
    }

    Ok(())
}

fn cmd_report(input: &Path, out_dir: &Path, config: &SiftConfig) -> Result<(), SiftCliError> {
    let table = read_table(input, config)?;
    let summary = TableSummary::of(&table, config.report.head_rows);
    print_summary(&table, &summary);

    let Prepared { table: prepared, report } = Preparer::new(config).prepare(&table);

    println!();
    println!("Duplicate Rows: {}", report.duplicates_removed);
    print_pipeline_report(&report);

    let prepared_summary = TableSummary::of(&prepared.to_raw(), config.report.head_rows);
    println!();
    println!("Data Types (prepared):");
    for column in &prepared_summary.columns {
        println!("  {:<28} {}", column.name, column.column_type);
    }

    if prepared.is_empty() {
        println!();
        println!("Warning: no records survived preparation; charts will be empty");
    }

    fs::create_dir_all(out_dir)?;
    let charts = ChartSet::from_table(&prepared, &config.report);
    let encoder = ArtifactEncoder::new();

    println!();
    println!("Charts (run {}):", encoder.run_id());
    for kind in ChartKind::ALL {
        let path = out_dir.join(format!("{}.vl.json", kind.file_stem()));
        fs::write(&path, encoder.encode_chart_to_json(kind, &charts)?)?;
        println!("  {}: {}", kind.title(), path.display());
    }

    println!();
    println!("Analysis Complete.");
    Ok(())
}

fn cmd_schema(json_schema: bool) -> Result<(), SiftCliError> {
    if json_schema {
        println!("{}", serde_json::to_string_pretty(&input_json_schema())?);
        return Ok(());
    }

    println!("Input Schema: delimited text table with a header row");
    println!();
    println!("Required columns (header match is case-insensitive):");
    for field in NumericField::ALL {
        let kind = match field.kind() {
            NumericKind::Integer => "integer",
            NumericKind::Real => "real",
        };
        println!("  - {:<26} {}", field.column_name(), kind);
    }
    println!("  - {:<26} text", PRIMARY_PLATFORM_COLUMN);
    println!("  - {:<26} text", GAD_7_SEVERITY_COLUMN);
    println!();
    println!("Any other columns are carried through unchanged.");
    println!();
    println!("Derived column: {}", SCREEN_TIME_CATEGORY_COLUMN);
    println!("  (0, 2]  Low");
    println!("  (2, 5]  Moderate");
    println!("  (5, 8]  High");
    println!("  (8, 16] Very High");

    Ok(())
}

// Helper functions

fn print_summary(table: &RawTable, summary: &TableSummary) {
    let (rows, columns) = summary.shape();
    println!("Dataset Shape: ({}, {})", rows, columns);

    println!();
    println!("Columns:");
    for name in summary.column_names() {
        println!("  {}", name);
    }

    println!();
    println!("Sample Data:");
    print_rows(table.columns(), &summary.head);

    println!();
    println!("Missing Values:");
    for column in &summary.columns {
        println!("  {:<28} {}", column.name, column.missing);
    }

    println!();
    println!("Data Types:");
    for column in &summary.columns {
        println!("  {:<28} {}", column.name, column.column_type);
    }
}

fn print_rows(columns: &[String], rows: &[Vec<RawCell>]) {
    let cell_text = |cell: &RawCell| cell.as_deref().unwrap_or("NaN").to_string();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|row| cell_text(&row[i]).len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("{:<w$}", name, w = w))
        .collect();
    println!("  {}", header.join("  "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell_text(cell), w = w))
            .collect();
        println!("  {}", line.join("  "));
    }
}

fn print_pipeline_report(report: &PipelineReport) {
    println!();
    println!("Preparation");
    println!("===========");
    for stage in &report.stages {
        println!(
            "  {:<20} {:>7} -> {:<7} ({} dropped)",
            stage.stage.as_str(),
            stage.rows_in,
            stage.rows_out,
            stage.dropped()
        );
    }

    if !report.coercion_failures.is_empty() {
        println!();
        println!("Unparseable numeric cells:");
        for (field, count) in &report.coercion_failures {
            println!("  {:<28} {}", field.column_name(), count);
        }
    }

    let rejections = &report.bounds_rejections;
    println!();
    println!("Bounds rejections:");
    println!("  missing numeric field        {}", rejections.missing_numeric);
    println!("  infinite numeric field       {}", rejections.non_finite);
    println!("  screen time out of bounds    {}", rejections.screen_time_out_of_bounds);
    println!("  sleep out of bounds          {}", rejections.sleep_out_of_bounds);

    if report.unlabeled > 0 {
        println!();
        println!(
            "Records without a screen time category (screen time outside every bin): {}",
            report.unlabeled
        );
    }
}

fn input_json_schema() -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    for field in NumericField::ALL {
        let description = match field.kind() {
            NumericKind::Integer => "whole number; fractional values are accepted",
            NumericKind::Real => "real number",
        };
        properties.insert(
            field.column_name().to_string(),
            serde_json::json!({ "type": "number", "description": description }),
        );
    }
    properties.insert(
        PRIMARY_PLATFORM_COLUMN.to_string(),
        serde_json::json!({ "type": "string" }),
    );
    properties.insert(
        GAD_7_SEVERITY_COLUMN.to_string(),
        serde_json::json!({ "type": "string" }),
    );

    let required: Vec<&String> = properties.keys().collect();

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "survey.row",
        "description": "One respondent of the screen time and mental health survey",
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

// Error types

#[derive(Debug)]
enum SiftCliError {
    Io(io::Error),
    Sift(SiftError),
    Json(serde_json::Error),
}

impl From<io::Error> for SiftCliError {
    fn from(e: io::Error) -> Self {
        SiftCliError::Io(e)
    }
}

impl From<SiftError> for SiftCliError {
    fn from(e: SiftError) -> Self {
        SiftCliError::Sift(e)
    }
}

impl From<serde_json::Error> for SiftCliError {
    fn from(e: serde_json::Error) -> Self {
        SiftCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SiftCliError> for CliError {
    fn from(e: SiftCliError) -> Self {
        match e {
            SiftCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SiftCliError::Sift(e) => {
                let (code, hint) = match &e {
                    SiftError::MissingColumn(_) => (
                        "MISSING_COLUMN",
                        Some("Run 'sift schema' to list the required columns"),
                    ),
                    SiftError::RaggedRow { .. } | SiftError::CsvError(_) => (
                        "MALFORMED_TABLE",
                        Some("Check the delimiter and quoting of the input"),
                    ),
                    SiftError::ConfigParseError(_) | SiftError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        Some("Check the --config file"),
                    ),
                    SiftError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
                    SiftError::JsonError(_) | SiftError::EncodingError(_) => {
                        ("ENCODING_ERROR", None)
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            SiftCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
        }
    }
}
