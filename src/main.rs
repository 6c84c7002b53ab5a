use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::time::Duration;
use tracing::{error, info, warn};

use ticker_sync::config::{split_ids, Settings};
use ticker_sync::market_data::HttpTickerSource;
use ticker_sync::persist::dry_run::DryRunStore;
use ticker_sync::persist::notion::NotionStore;
use ticker_sync::persist::RecordStore;
use ticker_sync::pipeline;
use ticker_sync::reconcile::MissingPricePolicy;
use ticker_sync::telemetry;

/// Copy USDT spot prices from binance, bybit, okx and coinex into Notion databases.
#[derive(Debug, Parser)]
#[command(name = "ticker-sync", version)]
struct Cli {
    /// Config file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated database ids, overrides configuration
    #[arg(long, value_name = "IDS")]
    database_ids: Option<String>,

    /// Writes per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// What to do with records whose symbol has no price
    #[arg(long, value_enum)]
    missing_price: Option<MissingPricePolicy>,

    /// Repeat every N seconds instead of running once
    #[arg(long, value_name = "N")]
    interval_secs: Option<u64>,

    /// Read everything, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Port for the Prometheus exporter (metrics-exporter feature only)
    #[arg(long, default_value_t = 9000)]
    metrics_port: u16,
}

fn settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(ids) = &cli.database_ids {
        settings.database_ids = split_ids(ids);
    }
    if let Some(batch_size) = cli.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(policy) = cli.missing_price {
        settings.missing_price = policy;
    }
    if cli.interval_secs.is_some() {
        settings.interval_secs = cli.interval_secs;
    }
    settings.validate()?;
    Ok(settings)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = settings(&cli)?;
    telemetry::init_metrics(cli.metrics_port)?;

    let source = HttpTickerSource::new(settings.request_timeout())?;
    let notion = NotionStore::new(
        &settings.api_key,
        &settings.notion,
        &settings.properties,
        settings.request_timeout(),
    )?;
    let store: Arc<dyn RecordStore> = if cli.dry_run {
        warn!("dry run: no records will be written");
        Arc::new(DryRunStore::new(notion))
    } else {
        Arc::new(notion)
    };

    match settings.interval_secs {
        Some(secs) => {
            info!(every_secs = secs, "starting periodic sync");
            pipeline::run_forever(&settings, &source, store.as_ref(), Duration::from_secs(secs)).await?;
        }
        None => {
            let summary = pipeline::run(&settings, &source, store.as_ref()).await?;
            info!(
                collections = summary.collections.len(),
                written = summary.written(),
                "sync complete"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // load .env

    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
