//! Sector leaders and Sharpe-based ranking.

use std::cmp::Ordering;

use crate::models::{Leader, Leaders, SectorRanking, SectorStats};

/// Best and worst sectors on each headline metric.
///
/// Ties go to the sector that comes first; undefined values never lead.
pub fn find_leaders(stats: &[SectorStats]) -> Leaders {
    Leaders {
        best_return: pick(stats, |s| Some(s.total_return), Ordering::Greater),
        worst_return: pick(stats, |s| Some(s.total_return), Ordering::Less),
        best_sharpe: pick(stats, |s| s.sharpe_ratio, Ordering::Greater),
        lowest_volatility: pick(stats, |s| s.volatility, Ordering::Less),
    }
}

fn pick<F>(stats: &[SectorStats], metric: F, wins: Ordering) -> Option<Leader>
where
    F: Fn(&SectorStats) -> Option<f64>,
{
    let mut leader: Option<Leader> = None;
    for s in stats {
        let Some(value) = metric(s).filter(|v| v.is_finite()) else {
            continue;
        };
        let replace = match &leader {
            None => true,
            Some(current) => value.partial_cmp(&current.value) == Some(wins),
        };
        if replace {
            leader = Some(Leader {
                sector: s.sector.clone(),
                value,
            });
        }
    }
    leader
}

/// Return per unit of volatility. `None` when volatility is zero or undefined.
pub fn risk_adjusted_score(stats: &SectorStats) -> Option<f64> {
    stats
        .volatility
        .filter(|v| *v != 0.0)
        .map(|v| stats.total_return / v)
        .filter(|s| s.is_finite())
}

/// Rank sectors by Sharpe ratio, highest first.
///
/// Tied Sharpe ratios share the average of the positions they span. Sectors
/// without a Sharpe ratio get no rank and sort last, keeping their order.
pub fn rank_sectors(stats: &[SectorStats]) -> Vec<SectorRanking> {
    let sharpes: Vec<Option<f64>> = stats
        .iter()
        .map(|s| s.sharpe_ratio.filter(|v| v.is_finite()))
        .collect();

    let mut rankings: Vec<SectorRanking> = stats
        .iter()
        .zip(&sharpes)
        .map(|(s, sharpe)| SectorRanking {
            sector: s.sector.clone(),
            risk_adjusted_score: risk_adjusted_score(s),
            overall_rank: sharpe.map(|v| average_rank(v, &sharpes)),
        })
        .collect();

    rankings.sort_by(|a, b| match (a.overall_rank, b.overall_rank) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    rankings
}

fn average_rank(value: f64, all: &[Option<f64>]) -> f64 {
    let defined = all.iter().flatten();
    let higher = defined.clone().filter(|v| **v > value).count();
    let tied = defined.filter(|v| **v == value).count();
    higher as f64 + (tied as f64 + 1.0) / 2.0
}
