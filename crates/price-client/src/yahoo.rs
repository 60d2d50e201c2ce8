use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use sector_core::{DateWindow, FetchError, PriceSource, RawPriceHistory};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Connection settings for [`YahooFinanceClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Retries after the first attempt for 429, 5xx and transport failures.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub rate_limit_per_minute: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
            rate_limit_per_minute: 120,
        }
    }
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    config: ClientConfig,
    rate_limiter: RateLimiter,
}

// Chart endpoint payload. Only the fields used for daily closes are mapped.

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Option<Vec<Option<f64>>>,
}

/// Decode a chart response body into a raw history.
///
/// Returns `Ok(None)` when the provider reports the symbol as unknown. Dates
/// are exchange-local trading days.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<Option<RawPriceHistory>, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        symbol: symbol.to_string(),
        message: e.to_string(),
    })?;

    let result = match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => {
            if let Some(error) = envelope.chart.error {
                tracing::debug!(
                    symbol,
                    code = %error.code,
                    description = error.description.as_deref().unwrap_or(""),
                    "Chart lookup returned no result"
                );
            }
            return Ok(None);
        }
    };

    let dates = result
        .timestamp
        .iter()
        .map(|ts| to_trading_day(*ts, result.meta.gmtoffset))
        .collect::<Option<Vec<NaiveDate>>>()
        .ok_or_else(|| FetchError::Decode {
            symbol: symbol.to_string(),
            message: "timestamp out of range".to_string(),
        })?;

    let close = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close);
    let adjusted_close = result
        .indicators
        .adjclose
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|b| b.adjclose);

    for column in [&close, &adjusted_close].into_iter().flatten() {
        if column.len() != dates.len() {
            return Err(FetchError::Decode {
                symbol: symbol.to_string(),
                message: format!(
                    "price column has {} entries for {} timestamps",
                    column.len(),
                    dates.len()
                ),
            });
        }
    }

    Ok(Some(RawPriceHistory {
        symbol: symbol.to_string(),
        dates,
        adjusted_close,
        close,
    }))
}

fn to_trading_day(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmtoffset)?, 0).map(|dt| dt.date_naive())
}

/// Exponential backoff for retry `attempt` (zero-based), capped at one minute.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

impl YahooFinanceClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60)),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request with rate limiting and retry on 429, 5xx, timeouts and connect errors.
    async fn send_request(
        &self,
        symbol: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let request = builder.build().map_err(|e| FetchError::Request {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })?;

        let mut attempt = 0u32;
        loop {
            self.rate_limiter.acquire().await;
            let req_clone = request.try_clone().ok_or_else(|| FetchError::Request {
                symbol: symbol.to_string(),
                message: "cannot clone request".to_string(),
            })?;

            let reason = match self.client.execute(req_clone).await {
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable {
                        return Ok(response);
                    }
                    if attempt >= self.config.max_retries {
                        if status == StatusCode::TOO_MANY_REQUESTS {
                            return Err(FetchError::RateLimited {
                                symbol: symbol.to_string(),
                                attempts: attempt + 1,
                            });
                        }
                        return Err(FetchError::Status {
                            symbol: symbol.to_string(),
                            status: status.as_u16(),
                            body: response.text().await.unwrap_or_default(),
                        });
                    }
                    format!("HTTP {}", status.as_u16())
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.config.max_retries => {
                    e.to_string()
                }
                Err(e) => {
                    return Err(FetchError::Request {
                        symbol: symbol.to_string(),
                        message: e.to_string(),
                    })
                }
            };

            let wait = backoff_delay(self.config.retry_base_delay, attempt);
            attempt += 1;
            tracing::warn!(
                symbol,
                %reason,
                "Price request failed, waiting {:.1}s before retry {}/{}",
                wait.as_secs_f64(),
                attempt,
                self.config.max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        window: &DateWindow,
    ) -> Result<Option<RawPriceHistory>, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        );
        let query = [
            ("period1", window.start.timestamp().to_string()),
            ("period2", window.end.timestamp().to_string()),
            ("interval", "1d".to_string()),
            ("includeAdjustedClose", "true".to_string()),
            ("events", "div,split".to_string()),
        ];

        tracing::debug!(symbol, %window, "Requesting daily chart");
        let response = self
            .send_request(symbol, self.client.get(&url).query(&query))
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(symbol, "Chart endpoint does not know this symbol");
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| FetchError::Request {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        parse_chart_response(symbol, &body)
    }
}
