use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use healthcare_etl::{db, logging, pipeline, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "healthcare-etl", version, about = "Load providers, patients and claims into SQLite")]
struct Cli {
    /// Settings file (defaults to $CONFIG_PATH, then config/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, clean and upsert all three tables (default)
    Run {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check row counts, foreign-key enforcement and orphan claims in the store
    Verify {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let (dispatch, guard) =
        logging::build_dispatch(&settings.logging).context("Failed to set up logging")?;

    let command = cli.command.unwrap_or(Command::Run { json: false });
    let outcome = tracing::dispatcher::with_default(&dispatch, || {
        let result = match command {
            Command::Run { json } => run_import(&settings, json),
            Command::Verify { json } => run_verify(&settings, json),
        };
        if let Err(e) = &result {
            error!("ETL run failed: {:#}", e);
        }
        result
    });

    // flush the log file before leaving
    drop(guard);

    match outcome? {
        true => Ok(ExitCode::SUCCESS),
        false => Ok(ExitCode::FAILURE),
    }
}

fn run_import(settings: &Settings, json: bool) -> Result<bool> {
    let summary = pipeline::run(settings).context("Pipeline aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("🗄️  ETL run {}", summary.run_id);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        print!("{}", summary);
        if summary.total_failed() > 0 {
            println!("\n⚠️  {} rows rejected by the store (see log)", summary.total_failed());
        } else {
            println!("\n✓ All cleaned rows loaded");
        }
    }

    Ok(true)
}

fn run_verify(settings: &Settings, json: bool) -> Result<bool> {
    let conn = db::open_store(&settings.database.path).context("Failed to open target store")?;
    let report = db::integrity_report(&conn).context("Integrity check failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🔍 Verifying {}", settings.database.path.display());
        println!("  Providers:      {}", report.providers);
        println!("  Patients:       {}", report.patients);
        println!("  Claims:         {}", report.claims);
        println!("  Foreign keys:   {}", if report.foreign_keys_enabled { "on" } else { "off" });
        println!("  Orphan claims:  {}", report.orphan_claims);
        if report.is_healthy() {
            println!("✅ Store looks healthy");
        } else {
            println!("❌ Store failed verification");
        }
    }

    Ok(report.is_healthy())
}
