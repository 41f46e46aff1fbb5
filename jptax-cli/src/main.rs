use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jptax_cli::app;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// What-if calculator for Japanese personal taxes.
///
/// Reads a JSON input describing one taxpayer's year, then computes
/// income tax, resident tax, social insurance premiums, and the
/// furusato-nozei donation limit with a line-by-line trace.
#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the supported rule years.
    Years,

    /// Print a fully populated demonstration input.
    Demo {
        /// Tax year the demonstration input targets.
        #[arg(long, default_value = "2024")]
        year: i32,

        /// Write the JSON here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Calculate taxes from a JSON input file.
    Calc {
        /// Path to the JSON input.
        #[arg(long)]
        input: PathBuf,

        /// Print every calculation line as an aligned table.
        #[arg(long)]
        trace: bool,

        /// Print the raw engine output as JSON.
        #[arg(long)]
        json: bool,

        /// Run the engine even when validation reports errors.
        #[arg(long)]
        no_validate: bool,
    },

    /// Manage saved snapshots.
    Save {
        /// Database backend to use.
        #[arg(long, default_value = "sqlite")]
        backend: String,

        /// Database connection string.
        /// For SQLite this is a URL like `sqlite:jptax.db?mode=rwc` or `:memory:`.
        #[arg(long, default_value = "sqlite:jptax.db?mode=rwc")]
        database: String,

        #[command(subcommand)]
        action: SaveAction,
    },
}

#[derive(Debug, Subcommand)]
enum SaveAction {
    /// List saved snapshots, most recently updated first.
    List,

    /// Calculate from a JSON input file and save the snapshot.
    Create {
        /// Path to the JSON input.
        #[arg(long)]
        input: PathBuf,

        /// Snapshot name; generated from the year and date when omitted.
        #[arg(long)]
        name: Option<String>,
    },

    /// Rename a saved snapshot.
    Rename {
        /// Snapshot id.
        #[arg(long)]
        id: i64,

        /// New name.
        #[arg(long)]
        name: String,
    },

    /// Delete a saved snapshot.
    Delete {
        /// Snapshot id.
        #[arg(long)]
        id: i64,
    },
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `warn` so normal runs are quiet.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Years => app::run_years(),
        Command::Demo { year, out } => app::run_demo(year, out.as_deref())?,
        Command::Calc {
            input,
            trace,
            json,
            no_validate,
        } => app::run_calc(&input, trace, json, no_validate)?,
        Command::Save {
            backend,
            database,
            action,
        } => {
            debug!("connecting to {backend} backend");
            let store = app::connect(&backend, &database).await?;
            match action {
                SaveAction::List => app::run_save_list(&*store).await?,
                SaveAction::Create { input, name } => {
                    app::run_save_create(&*store, &input, name).await?
                }
                SaveAction::Rename { id, name } => {
                    app::run_save_rename(&*store, id, &name).await?
                }
                SaveAction::Delete { id } => app::run_save_delete(&*store, id).await?,
            }
        }
    }

    Ok(())
}
