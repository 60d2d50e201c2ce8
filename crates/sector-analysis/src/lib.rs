//! Sector return aggregation, risk statistics, ranking and correlation.
//!
//! Every stage is a plain function over owned data; [`SectorAnalyzer`] chains
//! them for a full run.

pub mod aggregate;
pub mod analyzer;
pub mod correlation;
pub mod metrics;
pub mod models;
pub mod ranking;
pub mod returns;

pub use aggregate::{aggregate_sectors, SectorAggregation};
pub use analyzer::{AnalysisSettings, SectorAnalyzer};
pub use correlation::{correlation_matrix, diversification_alerts, pearson_correlation};
pub use metrics::{compute_stats, cumulative_returns, max_drawdown, round_to};
pub use models::*;
pub use ranking::{find_leaders, rank_sectors};
