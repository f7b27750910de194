use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use daily_pnl::config::{AppConfig, DataFiles};
use daily_pnl::infrastructure::{rebase_history, PushClient, QuoteClient};
use daily_pnl::{exit_status, DailyPnlJob};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "daily-pnl", version, about = "Daily crypto portfolio valuation and PnL report")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Value the portfolio, push the report and record the day
    Run {
        /// Valuation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Add a constant to every ledger value after a deposit or withdrawal
    RebaseHistory {
        #[arg(long, allow_hyphen_values = true)]
        offset: i64,
        /// Ledger to rewrite, defaults to the configured history file
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Run { as_of: None }) {
        Command::Run { as_of } => run_daily(as_of).await,
        Command::RebaseHistory { offset, ledger } => rebase(offset, ledger),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_status(&err);
            error!("{:#} (exit status {})", err, code);
            ExitCode::from(code)
        }
    }
}

async fn run_daily(as_of: Option<NaiveDate>) -> Result<()> {
    let config = AppConfig::from_env()?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    info!("Configuration:");
    info!("  Quote endpoint: {}", config.quotes.endpoint);
    info!("  Symbols: {}", config.quotes.symbols.join(","));
    info!("  Quote currency: {}", config.quotes.quote_currency);
    info!("  Holdings: {}", config.files.holdings.display());
    info!("  History: {}", config.files.history.display());

    let source = QuoteClient::new(&config.quotes)?;
    let notifier = PushClient::new(&config.push)?;
    let job = DailyPnlJob::new(source, notifier, &config.quotes, &config.files);

    let summary = job.run(as_of).await?;
    if !summary.ledger_updated {
        warn!("Report delivered but {} was not updated", config.files.history.display());
    }
    Ok(())
}

fn rebase(offset: i64, ledger: Option<PathBuf>) -> Result<()> {
    let path = ledger.unwrap_or_else(|| DataFiles::from_env().history);
    let rows = rebase_history(&path, offset)
        .with_context(|| format!("Failed to rebase {}", path.display()))?;
    info!("Rewrote {} rows of {}", rows, path.display());
    Ok(())
}
