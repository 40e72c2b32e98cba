//! Labelsync: measurement/label synchronization for case labeling.
//!
//! Labelsync keeps per-case label records consistent between an annotation
//! tool layer and a measurement store, seeds default labels when a case is
//! first opened, and round-trips label data through flat CSV tables.
//!
//! # Modules
//!
//! - [`schema`]: label fields, panels and config loading
//! - [`model`]: records, identities and tool annotations
//! - [`events`]: the typed event bus both feeds are built on
//! - [`store`]: the measurement store contract and an in-memory store
//! - [`registration`]: source/mapping registration
//! - [`seed`]: one-time default labels per case
//! - [`sync`]: tool ↔ store synchronization and label edits
//! - [`table`]: CSV export, import and collation
//! - [`error`]: error types for labelsync operations

pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod registration;
pub mod schema;
pub mod seed;
pub mod store;
pub mod sync;
pub mod table;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

pub use error::LabelSyncError;

use model::{CaseId, RecordUid};
use schema::{Config, PanelScope, TableOptions};
use store::{snapshot, InMemoryStore, Source};

/// The labelsync CLI application.
#[derive(Parser)]
#[command(name = "labelsync")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Load and validate a label config.
    CheckConfig(CheckConfigArgs),
    /// Create the default label record of a case, once.
    Seed(SeedArgs),
    /// Set one label value on a stored record.
    Set(SetArgs),
    /// Export every record as a CSV table.
    Export(ExportArgs),
    /// Replace the stored records with the content of a CSV table.
    Import(ImportArgs),
}

#[derive(clap::Args)]
struct CheckConfigArgs {
    /// Config file (.yaml, .yml or .json).
    config: PathBuf,
}

#[derive(clap::Args)]
struct SeedArgs {
    /// Config file (.yaml, .yml or .json).
    #[arg(long)]
    config: PathBuf,

    /// Store snapshot (JSON); created if missing.
    #[arg(long)]
    store: PathBuf,

    /// Case identifier.
    #[arg(long = "case")]
    case_id: String,
}

#[derive(clap::Args)]
struct SetArgs {
    #[arg(long)]
    config: PathBuf,

    #[arg(long)]
    store: PathBuf,

    /// Record uid.
    #[arg(long)]
    uid: String,

    /// Label key.
    #[arg(long)]
    key: String,

    /// New value.
    #[arg(long)]
    value: String,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[arg(long)]
    store: PathBuf,

    /// Config providing the table layout; defaults apply without it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV file; stdout if omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// CSV table to import.
    input: PathBuf,

    #[arg(long)]
    config: PathBuf,

    #[arg(long)]
    store: PathBuf,

    /// Format of the printed import report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the labelsync CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelSyncError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckConfig(args)) => run_check_config(args),
        Some(Commands::Seed(args)) => run_seed(args),
        Some(Commands::Set(args)) => run_set(args),
        Some(Commands::Export(args)) => run_export(args),
        Some(Commands::Import(args)) => run_import(args),
        None => {
            println!("labelsync {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Measurement/label synchronization for case labeling.");
            println!();
            println!("Run 'labelsync --help' for usage information.");
            Ok(())
        }
    }
}

fn run_check_config(args: CheckConfigArgs) -> Result<(), LabelSyncError> {
    let config = schema::load_config(&args.config)?;
    println!(
        "Config OK: {} panel(s), {} case field(s), {} ROI field(s)",
        config.panels().len(),
        config.scope_fields(PanelScope::Case).count(),
        config.scope_fields(PanelScope::Roi).count()
    );
    Ok(())
}

fn run_seed(args: SeedArgs) -> Result<(), LabelSyncError> {
    let config = schema::load_config(&args.config)?;
    let (mut store, source) = open_store(&args.store)?;

    let case_id = CaseId::new(args.case_id);
    let outcome = seed::seed(&mut store, &source, &config, &case_id)?;
    if outcome.created() {
        snapshot::write_snapshot(&args.store, &store)?;
        println!("Seeded case {} ({})", case_id, outcome.uid());
    } else {
        println!("Case {} already seeded ({})", case_id, outcome.uid());
    }
    Ok(())
}

fn run_set(args: SetArgs) -> Result<(), LabelSyncError> {
    let config = schema::load_config(&args.config)?;
    let (mut store, _) = open_store(&args.store)?;

    let uid = RecordUid::new(args.uid);
    sync::update_label(&mut store, &config, &uid, &args.key, &args.value)?;
    snapshot::write_snapshot(&args.store, &store)?;
    println!("Set {}={} on {}", args.key, args.value, uid);
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), LabelSyncError> {
    let options = match &args.config {
        Some(path) => schema::load_config(path)?.table().clone(),
        None => TableOptions::default(),
    };
    let store = snapshot::read_snapshot(&args.store)?;
    let table = table::export_table(&store, &options);

    match &args.output {
        Some(path) => {
            table::write_table(path, &table)?;
            eprintln!("Exported {} record(s) to {}", table.rows.len(), path.display());
        }
        None => table::write_table_to(io::stdout().lock(), &table)?,
    }
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), LabelSyncError> {
    let config: Config = schema::load_config(&args.config)?;
    let (mut store, source) = open_store(&args.store)?;
    let input = table::read_table(&args.input)?;

    let report = table::import_table(&mut store, &source, &config, &input)?;
    snapshot::write_snapshot(&args.store, &store)?;

    match args.report {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| LabelSyncError::Io(e.into()))?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(LabelSyncError::ImportFailed { report })
    }
}

/// Loads a store snapshot and registers the labeling source on it.
fn open_store(path: &Path) -> Result<(InMemoryStore, Source), LabelSyncError> {
    let mut store = snapshot::read_snapshot(path)?;
    let source = registration::register_labeling_source(&mut store)?;
    Ok((store, source))
}
