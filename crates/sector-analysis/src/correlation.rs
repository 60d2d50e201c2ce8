use chrono::NaiveDate;
use std::collections::HashMap;

use crate::models::{CorrelationMatrix, DiversificationAlert, SectorReturnSeries};

/// Sums of squared deviations below this count as zero variance.
const MIN_VARIANCE: f64 = 1e-20;

/// Pearson correlation of two equally long samples.
///
/// `None` with fewer than two points or when either side is constant.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }

    let a = &a[..n];
    let b = &b[..n];

    let mean_a: f64 = a.iter().sum::<f64>() / n as f64;
    let mean_b: f64 = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a < MIN_VARIANCE || var_b < MIN_VARIANCE {
        return None;
    }

    let r = cov / (var_a * var_b).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Correlation over the dates both series share.
fn series_correlation(a: &SectorReturnSeries, b: &SectorReturnSeries) -> Option<f64> {
    let by_date: HashMap<NaiveDate, f64> = b.dates.iter().copied().zip(b.returns.iter().copied()).collect();

    let (left, right): (Vec<f64>, Vec<f64>) = a
        .dates
        .iter()
        .zip(&a.returns)
        .filter_map(|(d, r)| by_date.get(d).map(|other| (*r, *other)))
        .unzip();

    pearson_correlation(&left, &right)
}

/// Symmetric matrix with a unit diagonal, in `series` order.
pub fn correlation_matrix(series: &[SectorReturnSeries]) -> CorrelationMatrix {
    let n = series.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = series_correlation(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        sectors: series.iter().map(|s| s.sector.clone()).collect(),
        values,
    }
}

/// Pairs above `threshold`, each reported once in matrix order.
pub fn diversification_alerts(matrix: &CorrelationMatrix, threshold: f64) -> Vec<DiversificationAlert> {
    let mut alerts = Vec::new();
    for i in 0..matrix.len() {
        for j in (i + 1)..matrix.len() {
            if let Some(correlation) = matrix.get(i, j).filter(|r| *r > threshold) {
                alerts.push(DiversificationAlert {
                    first: matrix.sectors[i].clone(),
                    second: matrix.sectors[j].clone(),
                    correlation,
                });
            }
        }
    }
    alerts
}
