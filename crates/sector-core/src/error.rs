use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures at the price-download boundary. Every variant is fatal for a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request for {symbol} failed: {message}")]
    Request { symbol: String, message: String },

    #[error("HTTP {status} for {symbol}: {body}")]
    Status {
        symbol: String,
        status: u16,
        body: String,
    },

    #[error("Rate limited while fetching {symbol} after {attempts} attempts")]
    RateLimited { symbol: String, attempts: u32 },

    #[error("Failed to decode price response for {symbol}: {message}")]
    Decode { symbol: String, message: String },

    #[error("Neither adjusted close nor close found in downloaded data for {symbol}")]
    MissingPriceField { symbol: String },

    #[error("No price data returned for any of the {requested} requested symbols")]
    NoData { requested: usize },
}
