use statrs::statistics::Statistics;

use crate::models::{SectorReturnSeries, SectorStats};

/// Standard deviations below this are treated as zero.
const MIN_STD_DEV: f64 = 1e-12;

/// `C[t] = prod_{k<=t}(1 + r_k) - 1`
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

/// `min_t(C[t] / max_{k<=t} C[k] - 1)` as a fraction.
///
/// Points where the ratio is undefined (a running peak of 0) are skipped.
/// Every defined running peak compares with itself, so the result is <= 0.
/// Empty input gives 0.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &c in cumulative {
        peak = peak.max(c);
        let ratio = c / peak - 1.0;
        if ratio.is_finite() {
            worst = worst.min(ratio);
        }
    }

    worst
}

/// Risk and return summary for one sector.
///
/// `trading_days` annualizes the Sharpe ratio. Depends only on `series`.
pub fn compute_stats(series: &SectorReturnSeries, trading_days: u32) -> SectorStats {
    let returns = series.returns.as_slice();
    let cumulative = series.cumulative();

    let total_return = cumulative.last().copied().unwrap_or(0.0) * 100.0;
    let mean = if returns.is_empty() { 0.0 } else { returns.mean() };

    let std_dev = if returns.len() >= 2 {
        Some(returns.std_dev()).filter(|s| s.is_finite())
    } else {
        None
    };

    let sharpe_ratio = std_dev
        .filter(|s| *s >= MIN_STD_DEV)
        .map(|s| mean / s * f64::from(trading_days).sqrt())
        .filter(|s| s.is_finite());

    SectorStats {
        sector: series.sector.clone(),
        total_return,
        daily_avg_return: mean * 100.0,
        volatility: std_dev.map(|s| s * 100.0),
        sharpe_ratio,
        max_drawdown: max_drawdown(&cumulative) * 100.0,
        stocks_count: series.symbols_used.len(),
    }
}

/// Round half away from zero to `precision` decimals.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
