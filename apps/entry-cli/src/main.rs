//! # Forecourt Entry CLI
//!
//! `forecourt` drives the Sales & Collections form from the terminal.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  forecourt [--config PATH] [--base-url URL] <command>                   │
//! │                                                                         │
//! │  employees                     active roster                            │
//! │  products                      active products and prices               │
//! │  reconcile <sheet.toml>        enter the sheet, print totals, no submit │
//! │  submit <sheet.toml>           enter the sheet and submit it            │
//! │  history                       recent entries                           │
//! │  delete-latest                 delete the most recent entry             │
//! │  refill <product> <litres>     record a tank delivery                   │
//! │  init-config                   write the effective config to disk       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Log output goes to stderr, controlled by `RUST_LOG`.

mod report;
mod sheet;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forecourt_client::{ClientConfig, EntryApp};
use forecourt_core::Volume;

use sheet::Sheet;

#[derive(Debug, Parser)]
#[command(name = "forecourt")]
#[command(about = "Fuel-station Sales & Collections entry")]
struct Cli {
    /// Config file (default: platform config dir / forecourt.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sign in before running the command
    #[arg(long, global = true, env = "FORECOURT_USERNAME")]
    username: Option<String>,

    /// Password for --username
    #[arg(long, global = true, env = "FORECOURT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List active employees
    Employees,
    /// List active products
    Products,
    /// Enter a sheet and print the reconciliation without submitting
    Reconcile { sheet: PathBuf },
    /// Enter a sheet and submit it
    Submit { sheet: PathBuf },
    /// Show recent entries
    History,
    /// Delete the most recent entry
    DeleteLatest,
    /// Record a tank delivery
    Refill {
        product_id: i64,
        litres: f64,
        #[arg(long)]
        employee: i64,
    },
    /// Write the effective configuration to --config or the default path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.clone()).context("loading config")?;
    if let Some(url) = &cli.base_url {
        config.backend.base_url = url.clone();
        config.validate()?;
    }
    info!(base_url = %config.base_url(), strategy = %config.strategy(), "Forecourt CLI starting");

    let app = EntryApp::new(&config, Local::now().naive_local())?;
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        let session = app.api().login(username, password).await?;
        eprintln!("Signed in as {}", session.display_name());
    }

    let result = run(&app, &config, cli.config, cli.command).await;
    report::print_notices(&app.notices().drain());
    result
}

async fn run(
    app: &EntryApp,
    config: &ClientConfig,
    config_path: Option<PathBuf>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Employees => {
            let data = app.controller.load_reference_data().await;
            report::print_employees(&data.employees);
        }
        Command::Products => {
            let data = app.controller.load_reference_data().await;
            report::print_products(&data.products);
        }
        Command::Reconcile { sheet } => {
            let sheet = Sheet::read(&sheet)?;
            app.controller.load_reference_data().await;
            sheet.apply(&app.controller).await?;

            let view = app.controller.view();
            report::print_reconciliation(&view);
            match app.controller.form().with_form(|form| form.validate()) {
                Ok(()) => println!("Ready to submit."),
                Err(e) => println!("Not ready: {}", e),
            }
        }
        Command::Submit { sheet } => {
            let sheet = Sheet::read(&sheet)?;
            app.controller.load_reference_data().await;
            sheet.apply(&app.controller).await?;
            report::print_reconciliation(&app.controller.view());

            match app.coordinator.submit().await {
                Ok(receipt) => report::print_receipt(&receipt),
                Err(e) => bail!(e.submission_message()),
            }
        }
        Command::History => {
            let lines = app.history.lines().await?;
            report::print_history(&lines);
        }
        Command::DeleteLatest => {
            let id = app.history.delete_latest().await?;
            println!("Deleted entry {}", id);
        }
        Command::Refill {
            product_id,
            litres,
            employee,
        } => {
            if !litres.is_finite() || litres < 0.0 {
                bail!("litres must be a non-negative number, got {}", litres);
            }
            let receipt = app
                .inventory
                .refill(product_id, Volume::from_f64(litres), employee)
                .await?;
            report::print_refill(&receipt);
        }
        Command::InitConfig => {
            let path = config.save(config_path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=forecourt_client=trace` - Trace the HTTP client only
/// - Default: INFO, debug for forecourt crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forecourt=debug,entry_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
