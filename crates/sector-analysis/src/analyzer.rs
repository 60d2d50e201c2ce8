use sector_core::{AnalysisError, PriceTable, Sector};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_sectors, SectorAggregation};
use crate::correlation::{correlation_matrix, diversification_alerts};
use crate::metrics::compute_stats;
use crate::models::{
    CorrelationMatrix, DiversificationAlert, Leaders, ReturnTable, SectorAnalysis,
    SectorRanking, SectorReturnSeries, SectorStats,
};
use crate::ranking::{find_leaders, rank_sectors};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Periods per year used to annualize the Sharpe ratio.
    pub trading_days: u32,
    /// Pairs correlated strictly above this raise a diversification alert.
    pub correlation_threshold: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            trading_days: 252,
            correlation_threshold: 0.70,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.trading_days == 0 {
            return Err(AnalysisError::InvalidConfig(
                "trading days must be positive".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.correlation_threshold) {
            return Err(AnalysisError::InvalidConfig(format!(
                "correlation threshold {} is outside [-1, 1]",
                self.correlation_threshold
            )));
        }
        Ok(())
    }
}

/// Runs the sector comparison stages in order.
pub struct SectorAnalyzer {
    settings: AnalysisSettings,
}

impl Default for SectorAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisSettings::default())
    }
}

impl SectorAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn returns_stage(&self, prices: &PriceTable) -> Result<ReturnTable, AnalysisError> {
        ReturnTable::from_prices(prices)
    }

    pub fn aggregate_stage(
        &self,
        sectors: &[Sector],
        returns: &ReturnTable,
    ) -> Result<SectorAggregation, AnalysisError> {
        let aggregation = aggregate_sectors(sectors, returns);
        if aggregation.series.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "no sector has any symbol with price data".to_string(),
            ));
        }
        Ok(aggregation)
    }

    pub fn stats_stage(&self, series: &[SectorReturnSeries]) -> Vec<SectorStats> {
        series
            .iter()
            .map(|s| compute_stats(s, self.settings.trading_days))
            .collect()
    }

    pub fn ranking_stage(&self, stats: &[SectorStats]) -> (Vec<SectorRanking>, Leaders) {
        (rank_sectors(stats), find_leaders(stats))
    }

    pub fn correlation_stage(
        &self,
        series: &[SectorReturnSeries],
    ) -> (CorrelationMatrix, Vec<DiversificationAlert>) {
        let matrix = correlation_matrix(series);
        let alerts = diversification_alerts(&matrix, self.settings.correlation_threshold);
        (matrix, alerts)
    }

    /// Full run from validated prices to every derived output.
    pub fn analyze(
        &self,
        prices: &PriceTable,
        sectors: &[Sector],
    ) -> Result<SectorAnalysis, AnalysisError> {
        self.settings.validate()?;

        let returns = self.returns_stage(prices)?;
        tracing::info!(
            rows = returns.len(),
            symbols = returns.columns.len(),
            "Daily returns aligned"
        );

        let aggregation = self.aggregate_stage(sectors, &returns)?;
        tracing::info!(
            sectors = aggregation.series.len(),
            excluded = aggregation.excluded_sectors.len(),
            "Sector returns aggregated"
        );

        let stats = self.stats_stage(&aggregation.series);
        tracing::info!(sectors = stats.len(), "Sector statistics computed");

        let (rankings, leaders) = self.ranking_stage(&stats);
        if let Some(top) = rankings.first().filter(|r| r.overall_rank.is_some()) {
            tracing::info!(leader = %top.sector, "Sectors ranked by Sharpe ratio");
        }

        let (correlation, alerts) = self.correlation_stage(&aggregation.series);
        tracing::info!(alerts = alerts.len(), "Correlation matrix computed");

        Ok(SectorAnalysis {
            settings: self.settings,
            price_field: prices.field,
            window_rows: returns.len(),
            coverage: aggregation.coverage,
            excluded_sectors: aggregation.excluded_sectors,
            series: aggregation.series,
            stats,
            rankings,
            leaders,
            correlation,
            alerts,
        })
    }
}
