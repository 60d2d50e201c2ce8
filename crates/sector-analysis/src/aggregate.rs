use sector_core::Sector;

use crate::models::{ReturnTable, SectorCoverage, SectorReturnSeries};

/// Output of [`aggregate_sectors`].
#[derive(Debug, Clone, PartialEq)]
pub struct SectorAggregation {
    /// Sectors with at least one usable symbol, in configuration order.
    pub series: Vec<SectorReturnSeries>,
    /// One entry per configured sector, excluded ones included.
    pub coverage: Vec<SectorCoverage>,
    pub excluded_sectors: Vec<String>,
}

/// Equal-weight each sector's available symbols into one daily return series.
///
/// A sector with no symbol in `returns` is left out of every series and listed
/// in `excluded_sectors`.
pub fn aggregate_sectors(sectors: &[Sector], returns: &ReturnTable) -> SectorAggregation {
    let mut series = Vec::with_capacity(sectors.len());
    let mut coverage = Vec::with_capacity(sectors.len());
    let mut excluded_sectors = Vec::new();

    for sector in sectors {
        let (used, missing): (Vec<String>, Vec<String>) = sector
            .symbols
            .iter()
            .cloned()
            .partition(|s| returns.columns.contains_key(s));

        if !missing.is_empty() {
            tracing::info!(
                sector = %sector.name,
                missing = ?missing,
                "{}/{} symbols available",
                used.len(),
                sector.symbols.len()
            );
        }

        coverage.push(SectorCoverage {
            sector: sector.name.clone(),
            used: used.clone(),
            missing: missing.clone(),
        });

        if used.is_empty() {
            tracing::warn!(sector = %sector.name, "No symbols with price data, sector excluded");
            excluded_sectors.push(sector.name.clone());
            continue;
        }

        let columns: Vec<&[f64]> = used.iter().filter_map(|s| returns.column(s)).collect();
        let weight = columns.len() as f64;
        let sector_returns = (0..returns.len())
            .map(|i| columns.iter().map(|c| c[i]).sum::<f64>() / weight)
            .collect();

        series.push(SectorReturnSeries {
            sector: sector.name.clone(),
            symbols_used: used,
            symbols_missing: missing,
            dates: returns.dates.clone(),
            returns: sector_returns,
        });
    }

    SectorAggregation {
        series,
        coverage,
        excluded_sectors,
    }
}
