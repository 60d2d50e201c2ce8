use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::AnalysisError;

/// A named group of ticker symbols whose returns are averaged together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub symbols: Vec<String>,
}

impl Sector {
    pub fn new(name: impl Into<String>, symbols: &[&str]) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Download window, both ends in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Window covering the `days` calendar days before `end`.
    ///
    /// Fails when `days` is not positive or the start falls outside the
    /// representable date range.
    pub fn trailing(end: DateTime<Utc>, days: i64) -> Result<Self, AnalysisError> {
        if days <= 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "window must be at least one day, got {days}"
            )));
        }
        let start = TimeDelta::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                AnalysisError::InvalidConfig(format!("window of {days} days is out of range"))
            })?;
        Ok(Self { start, end })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Provider column a price table was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    AdjustedClose,
    Close,
}

impl PriceField {
    /// Human-readable label for the field
    pub fn to_label(&self) -> &'static str {
        match self {
            PriceField::AdjustedClose => "Adj Close",
            PriceField::Close => "Close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Daily history exactly as a provider delivered it, before validation.
///
/// Either price column may be missing entirely; individual entries may be
/// `None` for days the provider has no print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceHistory {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub adjusted_close: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
}

impl RawPriceHistory {
    pub fn column(&self, field: PriceField) -> Option<&[Option<f64>]> {
        match field {
            PriceField::AdjustedClose => self.adjusted_close.as_deref(),
            PriceField::Close => self.close.as_deref(),
        }
    }
}

/// Date-ordered prices for one symbol. Dates are strictly increasing; gaps are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub prices: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            prices: BTreeMap::new(),
        }
    }

    /// Build from parallel date/price columns.
    ///
    /// Non-finite and non-positive prices are treated as gaps. A repeated date
    /// keeps the last valid value seen.
    pub fn from_columns(symbol: impl Into<String>, dates: &[NaiveDate], values: &[Option<f64>]) -> Self {
        let mut series = Self::new(symbol);
        for (date, value) in dates.iter().zip(values) {
            if let Some(price) = value.filter(|p| p.is_finite() && *p > 0.0) {
                series.prices.insert(*date, price);
            }
        }
        series
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.prices.get(date).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Validated price data for every symbol the provider returned, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub field: PriceField,
    pub series: Vec<PriceSeries>,
}

impl PriceTable {
    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.symbol.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_trailing_window() {
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
        let window = DateWindow::trailing(end, 365).unwrap();
        assert_eq!(window.start_date(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(window.to_string(), "2024-06-30 to 2025-06-30");
    }

    #[test]
    fn test_trailing_window_rejects_out_of_range() {
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
        assert!(matches!(
            DateWindow::trailing(end, 200_000_000_000_000),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(matches!(
            DateWindow::trailing(end, 1_000_000_000),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(DateWindow::trailing(end, 0).is_err());
        assert!(DateWindow::trailing(end, -5).is_err());
    }

    #[test]
    fn test_price_series_drops_invalid_prices() {
        let dates = vec![day(3), day(4), day(5), day(6)];
        let values = vec![Some(100.0), None, Some(f64::NAN), Some(-1.0)];
        let series = PriceSeries::from_columns("AAPL", &dates, &values);
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(&day(3)), Some(100.0));
    }

    #[test]
    fn test_price_series_duplicate_date_keeps_last() {
        let dates = vec![day(3), day(4), day(4)];
        let values = vec![Some(100.0), Some(101.0), Some(102.0)];
        let series = PriceSeries::from_columns("AAPL", &dates, &values);
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(&day(4)), Some(102.0));
    }

    #[test]
    fn test_price_series_invalid_duplicate_keeps_valid_price() {
        let dates = vec![day(3), day(3), day(4), day(4)];
        let values = vec![Some(100.0), None, Some(f64::NAN), Some(101.0)];
        let series = PriceSeries::from_columns("AAPL", &dates, &values);
        assert_eq!(series.get(&day(3)), Some(100.0));
        assert_eq!(series.get(&day(4)), Some(101.0));
    }

    #[test]
    fn test_raw_history_column_selection() {
        let raw = RawPriceHistory {
            symbol: "MSFT".to_string(),
            dates: vec![day(3)],
            adjusted_close: None,
            close: Some(vec![Some(400.0)]),
        };
        assert!(raw.column(PriceField::AdjustedClose).is_none());
        assert_eq!(raw.column(PriceField::Close), Some(&[Some(400.0)][..]));
    }
}
