use sector_core::{DateWindow, FetchError, PriceField, PriceSeries, PriceSource, PriceTable, RawPriceHistory};

/// Download every symbol and validate the result into one price table.
///
/// Symbols the source does not know are skipped with a warning. Transport and
/// decode failures abort the whole download.
pub async fn fetch_price_table<S>(
    source: &S,
    symbols: &[String],
    window: &DateWindow,
) -> Result<PriceTable, FetchError>
where
    S: PriceSource + ?Sized,
{
    tracing::info!("Fetching daily prices for {} symbols ({})", symbols.len(), window);

    let mut histories = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match source.fetch_history(symbol, window).await? {
            Some(history) => histories.push(history),
            None => tracing::warn!(%symbol, "No price history returned, symbol skipped"),
        }
    }

    build_price_table(histories, symbols.len())
}

/// Pick one price field for the whole table and convert each history to a series.
///
/// Adjusted close wins when every history carries it, otherwise close must be
/// present everywhere. Histories with no usable price are dropped.
pub fn build_price_table(
    histories: Vec<RawPriceHistory>,
    requested: usize,
) -> Result<PriceTable, FetchError> {
    let histories: Vec<RawPriceHistory> = histories
        .into_iter()
        .filter(|h| {
            if h.dates.is_empty() {
                tracing::warn!(symbol = %h.symbol, "Empty price history, symbol skipped");
            }
            !h.dates.is_empty()
        })
        .collect();

    if histories.is_empty() {
        return Err(FetchError::NoData { requested });
    }

    let field = select_field(&histories)?;
    if field == PriceField::Close {
        tracing::warn!("Adjusted close unavailable for some symbols, falling back to close");
    }

    let mut series = Vec::with_capacity(histories.len());
    for history in &histories {
        let values = history.column(field).ok_or_else(|| FetchError::MissingPriceField {
            symbol: history.symbol.clone(),
        })?;
        let s = PriceSeries::from_columns(history.symbol.clone(), &history.dates, values);
        if s.is_empty() {
            tracing::warn!(symbol = %history.symbol, "No valid {} prices, symbol skipped", field);
            continue;
        }
        tracing::debug!(symbol = %s.symbol, points = s.len(), "Price series loaded");
        series.push(s);
    }

    if series.is_empty() {
        return Err(FetchError::NoData { requested });
    }

    Ok(PriceTable { field, series })
}

fn select_field(histories: &[RawPriceHistory]) -> Result<PriceField, FetchError> {
    let has = |field: PriceField| histories.iter().all(|h| h.column(field).is_some());

    if has(PriceField::AdjustedClose) {
        return Ok(PriceField::AdjustedClose);
    }
    if has(PriceField::Close) {
        return Ok(PriceField::Close);
    }

    let symbol = histories
        .iter()
        .find(|h| h.close.is_none())
        .map(|h| h.symbol.clone())
        .unwrap_or_default();
    Err(FetchError::MissingPriceField { symbol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashMap;

    struct StubSource {
        histories: HashMap<String, RawPriceHistory>,
    }

    #[async_trait]
    impl PriceSource for StubSource {
        async fn fetch_history(
            &self,
            symbol: &str,
            _window: &DateWindow,
        ) -> Result<Option<RawPriceHistory>, FetchError> {
            if symbol == "BROKEN" {
                return Err(FetchError::Status {
                    symbol: symbol.to_string(),
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(self.histories.get(symbol).cloned())
        }
    }

    fn dates() -> Vec<NaiveDate> {
        (3..6).map(|d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap()).collect()
    }

    fn history(symbol: &str, adj: bool, close: bool) -> RawPriceHistory {
        let values = vec![Some(10.0), Some(11.0), Some(12.0)];
        RawPriceHistory {
            symbol: symbol.to_string(),
            dates: dates(),
            adjusted_close: adj.then(|| values.clone()),
            close: close.then(|| values.iter().map(|v| v.map(|p| p + 1.0)).collect()),
        }
    }

    fn window() -> DateWindow {
        DateWindow::trailing(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(), 365).unwrap()
    }

    fn stub(histories: Vec<RawPriceHistory>) -> StubSource {
        StubSource {
            histories: histories.into_iter().map(|h| (h.symbol.clone(), h)).collect(),
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_prefers_adjusted_close() {
        let source = stub(vec![history("AAPL", true, true), history("MSFT", true, true)]);
        let table = fetch_price_table(&source, &symbols(&["AAPL", "MSFT"]), &window())
            .await
            .unwrap();
        assert_eq!(table.field, PriceField::AdjustedClose);
        assert_eq!(table.symbols().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        assert_eq!(table.get("AAPL").unwrap().get(&dates()[0]), Some(10.0));
    }

    #[tokio::test]
    async fn test_falls_back_to_close_for_whole_table() {
        let source = stub(vec![history("AAPL", true, true), history("MSFT", false, true)]);
        let table = fetch_price_table(&source, &symbols(&["AAPL", "MSFT"]), &window())
            .await
            .unwrap();
        assert_eq!(table.field, PriceField::Close);
        assert_eq!(table.get("AAPL").unwrap().get(&dates()[0]), Some(11.0));
    }

    #[tokio::test]
    async fn test_missing_price_field_is_fatal() {
        let source = stub(vec![history("AAPL", true, true), history("ODD", false, false)]);
        let err = fetch_price_table(&source, &symbols(&["AAPL", "ODD"]), &window())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::MissingPriceField { symbol: "ODD".to_string() });
    }

    #[tokio::test]
    async fn test_unknown_symbols_are_skipped() {
        let source = stub(vec![history("AAPL", true, true)]);
        let table = fetch_price_table(&source, &symbols(&["AAPL", "ZZZZ"]), &window())
            .await
            .unwrap();
        assert_eq!(table.series.len(), 1);
        assert!(table.get("ZZZZ").is_none());
    }

    #[tokio::test]
    async fn test_no_data_is_fatal() {
        let source = stub(vec![]);
        let err = fetch_price_table(&source, &symbols(&["A", "B"]), &window())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NoData { requested: 2 });
    }

    #[tokio::test]
    async fn test_source_error_aborts() {
        let source = stub(vec![history("AAPL", true, true)]);
        let err = fetch_price_table(&source, &symbols(&["AAPL", "BROKEN"]), &window())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
    }

    #[test]
    fn test_empty_histories_count_as_missing() {
        let mut empty = history("EMPTY", true, true);
        empty.dates.clear();
        empty.adjusted_close = Some(vec![]);
        empty.close = Some(vec![]);
        let err = build_price_table(vec![empty], 1).unwrap_err();
        assert_eq!(err, FetchError::NoData { requested: 1 });
    }

    #[test]
    fn test_all_null_prices_are_dropped() {
        let mut nulls = history("NULLS", true, true);
        nulls.adjusted_close = Some(vec![None, None, None]);
        let table = build_price_table(vec![history("AAPL", true, true), nulls], 2).unwrap();
        assert_eq!(table.series.len(), 1);
    }
}
