//! Statement analysis CLI - build and extend the holdings workbook.
//!
//! Prints a JSON envelope on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use serde_json::json;
use statement_core::{
    extract_statement, pipeline, ApiResponse, Config, Currency, Error, Table, Workbook,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statement-analysis")]
#[command(about = "Brokerage statement extraction and year-over-year holdings analysis")]
#[command(version)]
struct Cli {
    /// Config file (defaults to STATEMENT_ANALYSIS_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty workbook for first use
    NewWorkbook {
        /// Workbook path (.xlsx)
        path: PathBuf,
    },
    /// Fill a workbook from the first statements
    Init {
        /// Existing workbook to write into
        #[arg(short, long)]
        workbook: PathBuf,
        /// Statement PDFs
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Add one new statement's year to the workbook
    Append {
        /// Existing workbook to update
        #[arg(short, long)]
        workbook: PathBuf,
        /// Statement PDF
        file: PathBuf,
    },
    /// Show the tables a statement yields without writing anything
    Extract {
        /// Statement PDF
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, config: &Config) -> Result<serde_json::Value, Error> {
    match command {
        Commands::NewWorkbook { path } => {
            let workbook = Workbook::create(&path)?;
            Ok(json!({
                "workbook": workbook.path(),
                "sheets": workbook.sheet_names(),
            }))
        }
        Commands::Init { workbook, files } => {
            let summary = pipeline::initialize(&workbook, files.as_slice(), config)?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Append { workbook, file } => {
            let summary = pipeline::append(&workbook, &file, config)?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Extract { file } => {
            let tables = extract_statement(&file, config)?;
            let sheets: BTreeMap<String, &Table> = [Currency::Domestic, Currency::Foreign]
                .into_iter()
                .map(|currency| (tables.data_sheet(currency, config), tables.table(currency)))
                .collect();
            Ok(json!({
                "suffix": tables.suffix,
                "sheets": sheets,
            }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Config::load(cli.config.as_deref()).and_then(|config| run(cli.command, &config));

    match result {
        Ok(data) => {
            println!("{}", ApiResponse::ok(data).render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            println!("{}", ApiResponse::<()>::err(e.to_string()).render());
            ExitCode::FAILURE
        }
    }
}
