use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use price_client::ClientConfig;
use sector_analysis::AnalysisSettings;
use sector_core::{default_sectors, parse_sectors, AnalysisError, DateWindow, Sector};
use std::path::PathBuf;
use std::time::Duration;

const MAX_PRECISION: u32 = 8;

/// Compare return, risk and correlation across market sectors.
///
/// Downloads a trailing window of daily prices, equal-weights each sector's
/// stocks, and reports total return, volatility, Sharpe ratio, drawdown and
/// cross-sector correlation. Every option can also be set from the
/// environment or a `.env` file.
#[derive(Debug, Parser)]
#[command(name = "sector-compare", author, version, about)]
pub struct Cli {
    /// JSON file with sector definitions: `[{"name": "...", "symbols": [...]}]`.
    ///
    /// Defaults to five built-in US sectors.
    #[arg(long, env = "SECTORS_FILE")]
    pub sectors: Option<PathBuf>,

    /// Calendar days of history ending now.
    #[arg(long, env = "WINDOW_DAYS", default_value_t = 365)]
    pub window_days: i64,

    /// Sector pairs correlated above this raise a diversification alert.
    #[arg(long, env = "CORRELATION_THRESHOLD", default_value_t = 0.70, allow_negative_numbers = true)]
    pub correlation_threshold: f64,

    /// Trading days per year used to annualize the Sharpe ratio.
    #[arg(long, env = "TRADING_DAYS", default_value_t = 252)]
    pub trading_days: u32,

    /// Decimal places in the printed report and JSON export.
    #[arg(long, env = "REPORT_PRECISION", default_value_t = 2)]
    pub precision: u32,

    /// Directory the SVG charts are written to.
    #[arg(long, env = "CHART_DIR", default_value = "charts")]
    pub chart_dir: PathBuf,

    /// Skip chart rendering.
    #[arg(long, default_value_t = false)]
    pub no_charts: bool,

    /// Also write the rounded results as JSON to this file.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retries for rate-limited, failing or timed-out requests.
    #[arg(long, env = "FETCH_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Maximum price requests per minute.
    #[arg(long, env = "YAHOO_RATE_LIMIT", default_value_t = 120)]
    pub rate_limit: usize,

    /// Price API base URL.
    #[arg(long, env = "YAHOO_BASE_URL", default_value = price_client::yahoo::DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sectors: Vec<Sector>,
    pub window_days: i64,
    pub settings: AnalysisSettings,
    pub precision: u32,
    pub chart_dir: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub client: ClientConfig,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<AppConfig> {
        let sectors = match &self.sectors {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading sector file {}", path.display()))?;
                parse_sectors(&text)
                    .with_context(|| format!("parsing sector file {}", path.display()))?
            }
            None => default_sectors(),
        };

        DateWindow::trailing(Utc::now(), self.window_days)?;
        if self.precision > MAX_PRECISION {
            return Err(invalid(&format!("precision must be at most {}", MAX_PRECISION)));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout must be positive"));
        }
        if self.rate_limit == 0 {
            return Err(invalid("rate limit must be positive"));
        }

        let settings = AnalysisSettings {
            trading_days: self.trading_days,
            correlation_threshold: self.correlation_threshold,
        };
        settings.validate()?;

        Ok(AppConfig {
            sectors,
            window_days: self.window_days,
            settings,
            precision: self.precision,
            chart_dir: (!self.no_charts).then_some(self.chart_dir),
            json_path: self.json,
            client: ClientConfig {
                base_url: self.base_url,
                timeout: Duration::from_secs(self.timeout_secs),
                max_retries: self.max_retries,
                rate_limit_per_minute: self.rate_limit,
                ..ClientConfig::default()
            },
        })
    }
}

fn invalid(message: &str) -> anyhow::Error {
    AnalysisError::InvalidConfig(message.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sector-compare"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.sectors.len(), 5);
        assert_eq!(config.window_days, 365);
        assert_eq!(config.settings, AnalysisSettings::default());
        assert_eq!(config.precision, 2);
        assert_eq!(config.chart_dir, Some(PathBuf::from("charts")));
        assert_eq!(config.client.max_retries, 3);
        assert!(config.json_path.is_none());
    }

    #[test]
    fn test_no_charts_and_overrides() {
        let config = parse(&[
            "--no-charts",
            "--correlation-threshold",
            "0.5",
            "--trading-days",
            "260",
            "--json",
            "out.json",
        ])
        .into_config()
        .unwrap();
        assert!(config.chart_dir.is_none());
        assert_eq!(config.settings.correlation_threshold, 0.5);
        assert_eq!(config.settings.trading_days, 260);
        assert_eq!(config.json_path, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(parse(&["--window-days", "0"]).into_config().is_err());
        assert!(parse(&["--correlation-threshold", "1.5"]).into_config().is_err());
        assert!(parse(&["--trading-days", "0"]).into_config().is_err());
        assert!(parse(&["--precision", "12"]).into_config().is_err());
    }

    #[test]
    fn test_rejects_window_beyond_calendar() {
        let err = parse(&["--window-days", "200000000000000"]).into_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::InvalidConfig(_))
        ));
        assert_eq!(parse(&["--window-days", "3650"]).into_config().unwrap().window_days, 3650);
    }

    #[test]
    fn test_loads_sector_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sectors.json");
        std::fs::write(&path, r#"[{"name": "Chips", "symbols": ["nvda", "amd"]}]"#).unwrap();

        let config = parse(&["--sectors", path.to_str().unwrap()]).into_config().unwrap();
        assert_eq!(config.sectors, vec![Sector::new("Chips", &["NVDA", "AMD"])]);

        assert!(parse(&["--sectors", "/nonexistent/sectors.json"]).into_config().is_err());
    }
}
