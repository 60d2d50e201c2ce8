use chrono::NaiveDate;
use sector_core::{AnalysisError, PriceTable};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::ReturnTable;

impl ReturnTable {
    /// Day-over-day returns with strict alignment.
    ///
    /// The date index is the union of every series' dates. A row survives only
    /// when every symbol has a price on that date and on the previous index
    /// date, so the first row and any row touching a gap are dropped.
    pub fn from_prices(table: &PriceTable) -> Result<Self, AnalysisError> {
        if table.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "price table has no symbols".to_string(),
            ));
        }

        let index: Vec<NaiveDate> = table
            .series
            .iter()
            .flat_map(|s| s.prices.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut dates = Vec::new();
        let mut columns: BTreeMap<String, Vec<f64>> = table
            .series
            .iter()
            .map(|s| (s.symbol.clone(), Vec::new()))
            .collect();

        for pair in index.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let row: Option<Vec<f64>> = table
                .series
                .iter()
                .map(|s| Some(s.get(&curr)? / s.get(&prev)? - 1.0))
                .collect();

            let Some(row) = row else { continue };
            dates.push(curr);
            for (series, value) in table.series.iter().zip(row) {
                if let Some(column) = columns.get_mut(&series.symbol) {
                    column.push(value);
                }
            }
        }

        let dropped = index.len().saturating_sub(1) - dates.len();
        if dropped > 0 {
            tracing::debug!(
                dropped,
                kept = dates.len(),
                "Dropped return rows with a missing price on either side"
            );
        }

        if dates.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "no trading day has prices for all {} symbols on consecutive dates",
                table.series.len()
            )));
        }

        Ok(Self { dates, columns })
    }
}
