use anyhow::Context;
use chrono::{DateTime, Utc};
use price_client::fetch_price_table;
use sector_analysis::{SectorAnalysis, SectorAnalyzer};
use sector_core::{unique_symbols, DateWindow, PriceSource};
use sector_report::{charts, write_report, ConsoleReport};
use std::io::Write;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Analyze,
    Report,
    Charts,
    Export,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Analyze => "analyze",
            Stage::Report => "report",
            Stage::Charts => "charts",
            Stage::Export => "export",
        }
    }
}

pub struct RunOutput {
    pub window: DateWindow,
    pub analysis: SectorAnalysis,
    pub charts: Vec<PathBuf>,
}

/// Fetch, analyze and report, strictly in that order.
///
/// A fetch or analysis failure stops the run before anything is printed or
/// written. Chart failures are logged and do not fail the run.
pub async fn run<S, W>(
    source: &S,
    config: &AppConfig,
    now: DateTime<Utc>,
    out: &mut W,
) -> anyhow::Result<RunOutput>
where
    S: PriceSource + ?Sized,
    W: Write,
{
    let window =
        DateWindow::trailing(now, config.window_days).context("building the download window")?;
    let symbols = unique_symbols(&config.sectors);

    let prices = fetch_price_table(source, &symbols, &window)
        .await
        .context("downloading price data")?;
    tracing::info!(
        stage = Stage::Fetch.label(),
        symbols = prices.series.len(),
        requested = symbols.len(),
        field = %prices.field,
        "Stage complete"
    );

    let analysis = SectorAnalyzer::new(config.settings)
        .analyze(&prices, &config.sectors)
        .context("analyzing sector returns")?;
    tracing::info!(
        stage = Stage::Analyze.label(),
        sectors = analysis.stats.len(),
        rows = analysis.window_rows,
        "Stage complete"
    );

    let report = ConsoleReport::render(&analysis, &window, config.precision);
    out.write_all(report.as_bytes())
        .and_then(|_| out.flush())
        .context("writing report")?;
    tracing::info!(stage = Stage::Report.label(), "Stage complete");

    let mut chart_paths = Vec::new();
    if let Some(dir) = &config.chart_dir {
        match charts::render_all(&analysis, dir) {
            Ok(paths) => {
                tracing::info!(stage = Stage::Charts.label(), files = paths.len(), "Stage complete");
                chart_paths = paths;
            }
            Err(e) => tracing::warn!(stage = Stage::Charts.label(), error = %e, "Chart rendering failed"),
        }
    }

    if let Some(path) = &config.json_path {
        write_report(&analysis, &window, config.precision, path).context("writing JSON report")?;
        tracing::info!(stage = Stage::Export.label(), path = %path.display(), "Stage complete");
    }

    Ok(RunOutput {
        window,
        analysis,
        charts: chart_paths,
    })
}
