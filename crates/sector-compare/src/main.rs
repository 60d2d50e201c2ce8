//! sector-compare: compare risk and return across market sectors.
//!
//! Usage:
//!   cargo run -p sector-compare
//!   cargo run -p sector-compare -- --sectors sectors.json --window-days 180
//!   cargo run -p sector-compare -- --no-charts --json report.json

mod config;
mod pipeline;

use chrono::Utc;
use clap::Parser;
use price_client::YahooFinanceClient;

use crate::config::Cli;

const DEFAULT_LOG_FILTER: &str = "sector_compare=info,sector_analysis=info,price_client=warn";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        sectors = config.sectors.len(),
        window_days = config.window_days,
        "Starting sector comparison"
    );

    let client = YahooFinanceClient::new(config.client.clone());
    let mut stdout = std::io::stdout();
    let output = pipeline::run(&client, &config, Utc::now(), &mut stdout).await?;

    for path in &output.charts {
        tracing::info!(path = %path.display(), "Chart saved");
    }
    tracing::info!(
        window = %output.window,
        sectors = output.analysis.stats.len(),
        alerts = output.analysis.alerts.len(),
        "Analysis complete"
    );
    Ok(())
}
