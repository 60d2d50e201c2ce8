use sector_analysis::{
    round_to, AnalysisSettings, CorrelationMatrix, DiversificationAlert, Leader, Leaders,
    SectorAnalysis, SectorCoverage, SectorRanking, SectorStats,
};
use sector_core::{DateWindow, PriceField};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ReportError;

/// Machine-readable run summary. Every number is rounded to the report precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub window: DateWindow,
    pub price_field: PriceField,
    pub settings: AnalysisSettings,
    pub window_rows: usize,
    pub coverage: Vec<SectorCoverage>,
    pub excluded_sectors: Vec<String>,
    pub summary: Vec<SectorStats>,
    pub rankings: Vec<SectorRanking>,
    pub leaders: Leaders,
    pub correlation: CorrelationMatrix,
    pub alerts: Vec<DiversificationAlert>,
}

impl JsonReport {
    pub fn new(analysis: &SectorAnalysis, window: &DateWindow, precision: u32) -> Self {
        let round = |v: f64| round_to(v, precision);
        let round_leader = |l: &Option<Leader>| {
            l.as_ref().map(|l| Leader {
                sector: l.sector.clone(),
                value: round(l.value),
            })
        };

        Self {
            window: *window,
            price_field: analysis.price_field,
            settings: analysis.settings,
            window_rows: analysis.window_rows,
            coverage: analysis.coverage.clone(),
            excluded_sectors: analysis.excluded_sectors.clone(),
            summary: analysis.stats.iter().map(|s| s.rounded(precision)).collect(),
            rankings: analysis
                .rankings
                .iter()
                .map(|r| SectorRanking {
                    sector: r.sector.clone(),
                    risk_adjusted_score: r.risk_adjusted_score.map(round),
                    overall_rank: r.overall_rank,
                })
                .collect(),
            leaders: Leaders {
                best_return: round_leader(&analysis.leaders.best_return),
                worst_return: round_leader(&analysis.leaders.worst_return),
                best_sharpe: round_leader(&analysis.leaders.best_sharpe),
                lowest_volatility: round_leader(&analysis.leaders.lowest_volatility),
            },
            correlation: CorrelationMatrix {
                sectors: analysis.correlation.sectors.clone(),
                values: analysis
                    .correlation
                    .values
                    .iter()
                    .map(|row| row.iter().map(|v| v.map(round)).collect())
                    .collect(),
            },
            alerts: analysis
                .alerts
                .iter()
                .map(|a| DiversificationAlert {
                    first: a.first.clone(),
                    second: a.second.clone(),
                    correlation: round(a.correlation),
                })
                .collect(),
        }
    }
}

/// Serialize the rounded report to `path` as pretty JSON. Undefined values become `null`.
pub fn write_report(
    analysis: &SectorAnalysis,
    window: &DateWindow,
    precision: u32,
    path: &Path,
) -> Result<(), ReportError> {
    let report = JsonReport::new(analysis, window, precision);
    let body = serde_json::to_string_pretty(&report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    std::fs::write(path, body).map_err(|e| ReportError::io(path, e))?;

    tracing::info!(path = %path.display(), "JSON report written");
    Ok(())
}
