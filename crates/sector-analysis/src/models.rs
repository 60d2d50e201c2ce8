use chrono::NaiveDate;
use sector_core::PriceField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyzer::AnalysisSettings;
use crate::metrics::cumulative_returns;

/// Day-over-day returns for every symbol on the dates where all symbols traded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    pub dates: Vec<NaiveDate>,
    /// One column per symbol, each with `dates.len()` entries.
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl ReturnTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(|c| c.as_slice())
    }
}

/// Equal-weight daily returns for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorReturnSeries {
    pub sector: String,
    pub symbols_used: Vec<String>,
    pub symbols_missing: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<f64>,
}

impl SectorReturnSeries {
    /// Compounded return up to and including each date.
    pub fn cumulative(&self) -> Vec<f64> {
        cumulative_returns(&self.returns)
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Summary statistics for one sector. Percent fields are already scaled by 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorStats {
    pub sector: String,
    pub total_return: f64,
    pub daily_avg_return: f64,
    pub volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub stocks_count: usize,
}

impl SectorStats {
    /// Copy with every value rounded for display.
    pub fn rounded(&self, precision: u32) -> Self {
        use crate::metrics::round_to;
        Self {
            sector: self.sector.clone(),
            total_return: round_to(self.total_return, precision),
            daily_avg_return: round_to(self.daily_avg_return, precision),
            volatility: self.volatility.map(|v| round_to(v, precision)),
            sharpe_ratio: self.sharpe_ratio.map(|v| round_to(v, precision)),
            max_drawdown: round_to(self.max_drawdown, precision),
            stocks_count: self.stocks_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRanking {
    pub sector: String,
    pub risk_adjusted_score: Option<f64>,
    /// 1 is the highest Sharpe ratio. Ties share the average position.
    pub overall_rank: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub sector: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaders {
    pub best_return: Option<Leader>,
    pub worst_return: Option<Leader>,
    pub best_sharpe: Option<Leader>,
    pub lowest_volatility: Option<Leader>,
}

/// Pairwise Pearson correlations, rows and columns in `sectors` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub sectors: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Two sectors moving together closely enough to limit diversification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversificationAlert {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

/// Which configured symbols made it into a sector's returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCoverage {
    pub sector: String,
    pub used: Vec<String>,
    pub missing: Vec<String>,
}

impl SectorCoverage {
    pub fn is_excluded(&self) -> bool {
        self.used.is_empty()
    }
}

/// Everything a full run produces, in sector configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAnalysis {
    pub settings: AnalysisSettings,
    /// Price column the returns were computed from.
    pub price_field: PriceField,
    /// Aligned return rows shared by every sector.
    pub window_rows: usize,
    pub coverage: Vec<SectorCoverage>,
    pub excluded_sectors: Vec<String>,
    pub series: Vec<SectorReturnSeries>,
    pub stats: Vec<SectorStats>,
    pub rankings: Vec<SectorRanking>,
    pub leaders: Leaders,
    pub correlation: CorrelationMatrix,
    pub alerts: Vec<DiversificationAlert>,
}

impl SectorAnalysis {
    pub fn stats_for(&self, sector: &str) -> Option<&SectorStats> {
        self.stats.iter().find(|s| s.sector == sector)
    }

    pub fn ranking_for(&self, sector: &str) -> Option<&SectorRanking> {
        self.rankings.iter().find(|r| r.sector == sector)
    }
}
