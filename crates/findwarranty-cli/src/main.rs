//! FindWarranty CLI - track receipts and warranties from the terminal.
//!
//! Talks to the FindWarranty REST API through the core library's session
//! and receipt stores. The signed-in user persists between runs.

mod commands;
mod format;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use findwarranty_core::{AppContext, Config};

#[derive(Parser)]
#[command(name = "findwarranty")]
#[command(about = "Keep track of receipts and warranty expiry dates", long_about = None)]
struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in (password is prompted for, or read from FINDWARRANTY_PASSWORD)
    Login {
        username: Option<String>,
    },
    /// Create an account and sign in
    Register {
        username: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your receipts
    List,
    /// Add a receipt
    Add(ReceiptArgs),
    /// Edit a receipt
    Edit {
        id: i64,
        #[command(flatten)]
        receipt: ReceiptArgs,
    },
    /// Delete a receipt
    Delete {
        id: i64,
    },
    /// Show spending and warranty statistics
    Stats,
    /// Check whether a page may be opened with the current session
    Route {
        path: String,
    },
    /// Manage the offline asset cache
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },
}

#[derive(Args)]
pub struct ReceiptArgs {
    #[arg(long)]
    pub store: String,
    #[arg(long)]
    pub product: String,
    /// Purchase date, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,
    #[arg(long)]
    pub price: f64,
    #[arg(long)]
    pub category: String,
    /// e.g. "6 Months", "1 Year", "2 Years", "Lifetime"
    #[arg(long, default_value = "1 Year")]
    pub warranty: String,
    /// Receipt scan or PDF to attach
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum AssetsAction {
    /// Download the app's static assets into the cache
    Install,
    /// Print an asset, from the cache when available
    Get { path: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(api = %config.api_base_url, "FindWarranty CLI starting");

    let ctx = AppContext::bootstrap(config)?;

    match cli.command {
        Commands::Login { username } => commands::login(&ctx, username).await,
        Commands::Register { username } => commands::register(&ctx, &username).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::List => commands::list(&ctx).await,
        Commands::Add(args) => commands::add(&ctx, args).await,
        Commands::Edit { id, receipt } => commands::edit(&ctx, id, receipt).await,
        Commands::Delete { id } => commands::delete(&ctx, id).await,
        Commands::Stats => commands::stats(&ctx).await,
        Commands::Route { path } => commands::route(&ctx, &path).await,
        Commands::Assets { action } => match action {
            AssetsAction::Install => commands::assets_install(&ctx).await,
            AssetsAction::Get { path } => commands::assets_get(&ctx, &path).await,
        },
    }
}
