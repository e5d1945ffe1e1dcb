use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cargas_core::{process, FileInput, PipelineConfig, PipelineError, RunReport};
use cargas_parser::{load_table, DEFAULT_MIN_COLUMNS};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "Relatorio_Filtrado.xlsx";

#[derive(Parser, Debug)]
#[command(author, version, about = "Shipment report filter for the night shift", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, filter and export a shipment report
    Process(ProcessArgs),
    /// Load a report and show what the loader made of it
    Inspect(InspectArgs),
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Report exported from the shipping system
    input: PathBuf,
    /// Where to write the filtered workbook
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Shift reference date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Configuration file; falls back to CARGAS_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    input: PathBuf,
    /// Number of rows to preview
    #[arg(long, default_value_t = 5)]
    rows: usize,
    /// Minimum number of columns a table needs to be accepted
    #[arg(long)]
    min_columns: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process(args) => handle_process(args),
        Command::Inspect(args) => handle_inspect(args),
        Command::DefaultConfig => {
            print!("{}", PipelineConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn handle_process(args: ProcessArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let reference_date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let contents = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let name = args.input.file_name().and_then(|name| name.to_str());
    let input = FileInput {
        name,
        contents: &contents,
    };

    let output = with_hint(process(&input, &config, reference_date))
        .with_context(|| format!("failed to process {}", args.input.display()))?;

    fs::write(&args.output, &output.workbook)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), "workbook written");

    print_summary(&output.report);
    println!(
        "Wrote {} rows x {} columns to {}",
        output.report.exported_rows,
        output.report.exported_columns,
        args.output.display()
    );

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&output.report)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        println!("Run report written to {}", path.display());
    }

    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let contents = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let min_columns = args.min_columns.unwrap_or(DEFAULT_MIN_COLUMNS);

    let parsed = with_hint(load_table(&contents, min_columns).map_err(PipelineError::from))
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    println!("Format: {}", parsed.parser);
    for attempt in &parsed.attempts {
        println!("  rejected {attempt}");
    }
    println!(
        "Size: {} rows x {} columns",
        parsed.table.height(),
        parsed.table.width()
    );

    let mut table = Table::new();
    table.set_header(
        (0..parsed.table.width())
            .map(|column| column.to_string())
            .collect::<Vec<_>>(),
    );
    for row in parsed.table.rows().iter().take(args.rows) {
        table.add_row(row.iter().map(ToString::to_string).collect::<Vec<_>>());
    }
    println!("{table}");

    Ok(())
}

/// Explicit path first, then CARGAS_CONFIG, then the built-in defaults.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => env::var_os("CARGAS_CONFIG").map(PathBuf::from),
    };

    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            with_hint(PipelineConfig::from_path(&path))
                .with_context(|| format!("failed to load configuration {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn with_hint<T>(result: cargas_core::Result<T>) -> cargas_core::Result<T> {
    if let Err(err) = &result {
        warn!(error = %err, "run aborted");
        eprintln!("hint: {}", err.hint());
    }
    result
}

fn print_summary(report: &RunReport) {
    println!(
        "Loaded {} rows x {} columns ({})",
        report.loaded_rows, report.loaded_columns, report.format
    );
    println!(
        "Shift window: {} to {}",
        report.window.start, report.window.end
    );

    let mut table = Table::new();
    table.set_header(vec!["stage", "rows"]);
    table.add_row(vec!["loaded".to_string(), report.loaded_rows.to_string()]);
    for entry in &report.funnel {
        table.add_row(vec![entry.stage.to_string(), entry.rows.to_string()]);
    }
    println!("{table}");

    if report.invalid_dates > 0 {
        println!("Rows with invalid dates: {}", report.invalid_dates);
    }
    println!("Rows outside the window: {}", report.outside_window);
}
