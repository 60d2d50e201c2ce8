//! Sector group definitions.
//!
//! A sector is a fixed, user-defined list of tickers. The built-in set mirrors
//! five broad US sectors with five large caps each; a JSON file can replace it.

use crate::{AnalysisError, Sector};
use serde::Deserialize;
use std::collections::HashSet;

/// Built-in sector map, in report order.
pub fn default_sectors() -> Vec<Sector> {
    vec![
        Sector::new("Technology", &["AAPL", "MSFT", "GOOGL", "NVDA", "META"]),
        Sector::new("Finance", &["JPM", "BAC", "C", "GS", "MS"]),
        Sector::new("Energy", &["XOM", "CVX", "BP", "COP", "SLB"]),
        Sector::new("Healthcare", &["JNJ", "PFE", "MRK", "UNH", "ABBV"]),
        Sector::new("Consumer", &["PG", "KO", "PEP", "WMT", "COST"]),
    ]
}

#[derive(Debug, Deserialize)]
struct SectorEntry {
    name: String,
    #[serde(default)]
    symbols: Vec<String>,
}

/// Parse a sector file of the form `[{"name": "Technology", "symbols": ["AAPL", ...]}]`.
///
/// An array keeps the sector order stable for reporting and tie-breaking.
pub fn parse_sectors(json: &str) -> Result<Vec<Sector>, AnalysisError> {
    let entries: Vec<SectorEntry> = serde_json::from_str(json)
        .map_err(|e| AnalysisError::InvalidConfig(format!("sector file: {}", e)))?;
    normalize_sectors(
        entries
            .into_iter()
            .map(|e| Sector {
                name: e.name,
                symbols: e.symbols,
            })
            .collect(),
    )
}

/// Trim and upper-case symbols, drop duplicates within a sector, and reject
/// empty or repeated sector names.
pub fn normalize_sectors(sectors: Vec<Sector>) -> Result<Vec<Sector>, AnalysisError> {
    if sectors.is_empty() {
        return Err(AnalysisError::InvalidConfig(
            "at least one sector must be defined".to_string(),
        ));
    }

    let mut names = HashSet::new();
    let mut normalized = Vec::with_capacity(sectors.len());

    for sector in sectors {
        let name = sector.name.trim().to_string();
        if name.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "sector name must not be empty".to_string(),
            ));
        }
        if !names.insert(name.clone()) {
            return Err(AnalysisError::InvalidConfig(format!(
                "sector '{}' is defined more than once",
                name
            )));
        }

        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(sector.symbols.len());
        for raw in sector.symbols {
            let symbol = raw.trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            } else {
                tracing::warn!(sector = %name, %symbol, "Duplicate symbol ignored");
            }
        }

        normalized.push(Sector { name, symbols });
    }

    Ok(normalized)
}

/// Every symbol across all sectors, once, in first-seen order.
pub fn unique_symbols(sectors: &[Sector]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut symbols = Vec::new();
    for symbol in sectors.iter().flat_map(|s| &s.symbols) {
        if seen.insert(symbol.as_str()) {
            symbols.push(symbol.clone());
        }
    }
    symbols
}
