//! Daily price download for sector analysis.
//!
//! `YahooFinanceClient` talks to the Yahoo chart API; `fetch_price_table`
//! drives any `PriceSource` and validates the result once, at the boundary.

pub mod fetch;
mod rate_limit;
pub mod yahoo;

pub use fetch::{build_price_table, fetch_price_table};
pub use yahoo::{parse_chart_response, ClientConfig, YahooFinanceClient};
