// price-sheets: Generate print-ready price lists for the shop

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Target};
use log::LevelFilter;
use price_sheets::{generate, save, AppError, OutputFormat, Report};
use std::fs::File;
use std::path::PathBuf;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xlsx,
    Pdf,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Xlsx => OutputFormat::Xlsx,
            Format::Pdf => OutputFormat::Pdf,
        }
    }
}

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate price lists, scale lists and fridge labels")]
struct Args {
    /// Report to generate (see --list)
    #[arg(required_unless_present = "list")]
    report: Option<String>,

    /// Product catalog (JSON array of articles)
    #[arg(long, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Store whose articles are listed
    #[arg(long, default_value = "PLATTSALAT")]
    store: String,

    /// Output filename (defaults to {report}.{format})
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: Format,

    /// Date printed in the page header (YYYY-MM-DD format, defaults to today)
    #[arg(short, long)]
    date: Option<String>,

    /// List the available reports and exit
    #[arg(long)]
    list: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();
    init_logging(args.verbose, &args.log_file)?;

    if args.list {
        for report in Report::ALL {
            println!("{:<24} {}", report.id(), report.description());
        }
        return Ok(());
    }

    let id = args.report.as_deref().unwrap_or_default();
    let report = Report::from_id(id).ok_or_else(|| AppError::UnknownReport(id.to_string()))?;
    let date = parse_date(&args.date)?;
    let format = OutputFormat::from(args.format);

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", report.id(), format.extension())));

    let sheet = generate(report, &args.catalog, &args.store, date)?;
    save(&sheet, &output, format)?;

    let (cols, rows) = sheet.extent();
    println!("✓ Generated: {}", output.display());
    println!("  Report: {}", report.description());
    println!("  Sheet: {} ({} x {} cells)", sheet.name(), cols, rows);
    println!("  Zoom: {}%", sheet.page_style().scale);
    if let Some(header) = &sheet.page_style().header {
        println!("  Date: {}", header);
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn init_logging(verbose: u8, log_file: &Option<PathBuf>) -> Result<(), AppError> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = Builder::new();
    builder.filter_level(level).parse_default_env();
    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, AppError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| AppError::DateError(format!("{}: {}", s, e))),
        None => Ok(Local::now().date_naive()),
    }
}
