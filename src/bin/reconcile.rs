use std::path::PathBuf;

use anyhow::Context;
use bank_reconciliation::utils::init_tracing;
use bank_reconciliation::{reconcile_files, ReconciliationConfig, StrategyKind};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(
    name = "reconcile",
    about = "Reconcile system transactions against bank statement feeds",
    version
)]
struct Cli {
    /// JSON run configuration
    #[arg(short, long, conflicts_with_all = ["ledger", "statements", "start", "end"])]
    config: Option<PathBuf>,

    /// System transactions CSV file
    #[arg(long, required_unless_present = "config")]
    ledger: Option<PathBuf>,

    /// Bank statement CSV file; repeat for several feeds
    #[arg(long = "statement", required_unless_present = "config")]
    statements: Vec<PathBuf>,

    /// First day of the window, YYYY-MM-DD
    #[arg(long, required_unless_present = "config")]
    start: Option<NaiveDate>,

    /// Last day of the window, YYYY-MM-DD
    #[arg(long, required_unless_present = "config")]
    end: Option<NaiveDate>,

    /// Largest amount difference (exclusive) still considered a match
    #[arg(long)]
    match_epsilon: Option<BigDecimal>,

    /// Exclusive lower limit of the discrepancy band
    #[arg(long)]
    discrepancy_min: Option<BigDecimal>,

    /// Exclusive upper limit of the discrepancy band
    #[arg(long)]
    discrepancy_max: Option<BigDecimal>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Bucket statements by date before matching
    #[arg(long)]
    index_by_date: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    FirstFit,
    BestFit,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstFit => StrategyKind::FirstFit,
            StrategyArg::BestFit => StrategyKind::BestFit,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn build_config(cli: &Cli) -> anyhow::Result<ReconciliationConfig> {
    let mut config = match &cli.config {
        Some(path) => ReconciliationConfig::from_file(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?,
        None => {
            let ledger = cli.ledger.clone().context("--ledger is required")?;
            let start = cli.start.context("--start is required")?;
            let end = cli.end.context("--end is required")?;
            ReconciliationConfig::new(ledger, cli.statements.clone(), start, end)
        }
    };

    if let Some(epsilon) = &cli.match_epsilon {
        config.tolerances.match_epsilon = epsilon.clone();
    }
    if let Some(min) = &cli.discrepancy_min {
        config.tolerances.discrepancy_min = min.clone();
    }
    if let Some(max) = &cli.discrepancy_max {
        config.tolerances.discrepancy_max = max.clone();
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    if cli.index_by_date {
        config.index_by_date = true;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    });

    let config = build_config(&cli)?;
    let report = reconcile_files(&config)
        .await
        .context("reconciliation failed")?;

    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Text => println!("{}", report),
    }
    Ok(())
}
