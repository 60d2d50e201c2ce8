use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table};
use sector_analysis::{Leader, SectorAnalysis};
use sector_core::DateWindow;
use std::fmt;

use crate::{fmt_num, fmt_opt};

const RULE_WIDTH: usize = 72;

/// Plain-text summary of a sector analysis.
pub struct ConsoleReport<'a> {
    analysis: &'a SectorAnalysis,
    window: &'a DateWindow,
    precision: u32,
}

impl<'a> ConsoleReport<'a> {
    pub fn new(analysis: &'a SectorAnalysis, window: &'a DateWindow, precision: u32) -> Self {
        Self {
            analysis,
            window,
            precision,
        }
    }

    pub fn render(analysis: &SectorAnalysis, window: &DateWindow, precision: u32) -> String {
        ConsoleReport::new(analysis, window, precision).to_string()
    }

    fn coverage(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nData coverage:")?;
        for c in &self.analysis.coverage {
            let total = c.used.len() + c.missing.len();
            write!(f, "  {}: {}/{} stocks analyzed", c.sector, c.used.len(), total)?;
            if c.is_excluded() {
                write!(f, " (excluded, no price data)")?;
            } else if !c.missing.is_empty() {
                write!(f, " (missing: {})", c.missing.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Sector",
            "Total Return (%)",
            "Daily Avg Return (%)",
            "Volatility (%)",
            "Sharpe Ratio",
            "Max Drawdown (%)",
            "Stocks",
        ]);

        for s in &self.analysis.stats {
            table.add_row(vec![
                s.sector.clone(),
                fmt_num(s.total_return, precision),
                // Daily means are small; keep two extra digits.
                fmt_num(s.daily_avg_return, precision + 2),
                fmt_opt(s.volatility, precision),
                fmt_opt(s.sharpe_ratio, precision),
                fmt_num(s.max_drawdown, precision),
                s.stocks_count.to_string(),
            ]);
        }
        for i in 1..7 {
            if let Some(column) = table.column_mut(i) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }

        writeln!(f, "\nSECTOR PERFORMANCE SUMMARY")?;
        writeln!(f, "{}", table)
    }

    fn top_performers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leaders = &self.analysis.leaders;
        let p = self.precision;
        writeln!(f, "\nTOP PERFORMERS")?;
        writeln!(f, "  Best total return:  {}", leader(&leaders.best_return, p, "%"))?;
        writeln!(f, "  Worst total return: {}", leader(&leaders.worst_return, p, "%"))?;
        writeln!(f, "  Best Sharpe ratio:  {}", leader(&leaders.best_sharpe, p, ""))?;
        writeln!(f, "  Lowest volatility:  {}", leader(&leaders.lowest_volatility, p, "%"))
    }

    fn rankings(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.precision;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Rank",
            "Sector",
            "Return (%)",
            "Risk (%)",
            "Sharpe",
            "Return / Risk",
        ]);

        for r in &self.analysis.rankings {
            let Some(s) = self.analysis.stats_for(&r.sector) else {
                continue;
            };
            let rank = match r.overall_rank {
                Some(rank) if rank.fract() == 0.0 => format!("{}", rank as u32),
                Some(rank) => format!("{:.1}", rank),
                None => "n/a".to_string(),
            };
            table.add_row(vec![
                rank,
                r.sector.clone(),
                fmt_num(s.total_return, precision),
                fmt_opt(s.volatility, precision),
                fmt_opt(s.sharpe_ratio, precision),
                fmt_opt(r.risk_adjusted_score, precision),
            ]);
        }

        writeln!(f, "\nSECTOR RANKINGS (by Sharpe ratio)")?;
        writeln!(f, "{}", table)
    }

    fn recommendations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leaders = &self.analysis.leaders;
        let precision = self.precision;
        writeln!(f, "\nINVESTMENT RECOMMENDATIONS")?;
        if let Some(l) = &leaders.best_return {
            writeln!(
                f,
                "  Growth pick:    {} - highest absolute returns ({}%)",
                l.sector,
                fmt_num(l.value, precision)
            )?;
        }
        if let Some(l) = &leaders.best_sharpe {
            writeln!(
                f,
                "  Balanced pick:  {} - best risk-adjusted returns (Sharpe: {})",
                l.sector,
                fmt_num(l.value, precision)
            )?;
        }
        if let Some(l) = &leaders.lowest_volatility {
            writeln!(
                f,
                "  Defensive pick: {} - lowest volatility ({}%)",
                l.sector,
                fmt_num(l.value, precision)
            )?;
        }
        Ok(())
    }

    fn diversification(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        writeln!(f)?;
        if analysis.alerts.is_empty() {
            return writeln!(f, "DIVERSIFICATION: All sectors show good diversification potential");
        }

        writeln!(
            f,
            "DIVERSIFICATION ALERT (correlation above {}):",
            fmt_num(analysis.settings.correlation_threshold, self.precision)
        )?;
        for alert in &analysis.alerts {
            writeln!(
                f,
                "  {} and {} are highly correlated ({}) - consider diversifying",
                alert.first,
                alert.second,
                fmt_num(alert.correlation, self.precision)
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{}", rule)?;
        writeln!(f, "SECTOR PERFORMANCE COMPARISON")?;
        writeln!(f, "Analysis period: {}", self.window)?;
        writeln!(
            f,
            "Aligned trading days: {} | Prices: {}",
            self.analysis.window_rows, self.analysis.price_field
        )?;
        writeln!(f, "{}", rule)?;

        self.coverage(f)?;
        self.summary(f)?;
        self.top_performers(f)?;
        self.rankings(f)?;
        self.recommendations(f)?;
        self.diversification(f)?;

        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Key takeaways:")?;
        writeln!(f, "1. Compare total returns AND risk (volatility)")?;
        writeln!(f, "2. Sharpe ratio shows risk-adjusted performance")?;
        writeln!(f, "3. Correlation helps in portfolio diversification")?;
        writeln!(f, "4. Past performance doesn't guarantee future results")?;
        writeln!(f, "{}", rule)
    }
}

fn leader(leader: &Option<Leader>, precision: u32, unit: &str) -> String {
    match leader {
        Some(l) => format!("{} ({}{})", l.sector, fmt_num(l.value, precision), unit),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use sector_analysis::{
        AnalysisSettings, CorrelationMatrix, DiversificationAlert, Leaders, SectorCoverage,
        SectorRanking, SectorReturnSeries, SectorStats,
    };
    use sector_core::PriceField;

    pub(crate) fn sample_analysis() -> SectorAnalysis {
        let dates: Vec<NaiveDate> = (6..9)
            .map(|d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap())
            .collect();
        let stats = |sector: &str, total: f64, vol: Option<f64>, sharpe: Option<f64>| SectorStats {
            sector: sector.to_string(),
            total_return: total,
            daily_avg_return: total / 3.0,
            volatility: vol,
            sharpe_ratio: sharpe,
            max_drawdown: -1.25,
            stocks_count: 2,
        };

        SectorAnalysis {
            settings: AnalysisSettings::default(),
            price_field: PriceField::AdjustedClose,
            window_rows: 3,
            coverage: vec![
                SectorCoverage {
                    sector: "Technology".to_string(),
                    used: vec!["AAPL".to_string(), "MSFT".to_string()],
                    missing: vec![],
                },
                SectorCoverage {
                    sector: "Utilities".to_string(),
                    used: vec!["NEE".to_string(), "DUK".to_string()],
                    missing: vec!["XXXX".to_string()],
                },
                SectorCoverage {
                    sector: "Ghost".to_string(),
                    used: vec![],
                    missing: vec!["NOPE".to_string()],
                },
            ],
            excluded_sectors: vec!["Ghost".to_string()],
            series: vec![
                SectorReturnSeries {
                    sector: "Technology".to_string(),
                    symbols_used: vec!["AAPL".to_string(), "MSFT".to_string()],
                    symbols_missing: vec![],
                    dates: dates.clone(),
                    returns: vec![0.01, 0.02, -0.01],
                },
                SectorReturnSeries {
                    sector: "Utilities".to_string(),
                    symbols_used: vec!["NEE".to_string(), "DUK".to_string()],
                    symbols_missing: vec!["XXXX".to_string()],
                    dates,
                    returns: vec![0.0, 0.0, 0.0],
                },
            ],
            stats: vec![
                stats("Technology", 1.98, Some(1.53), Some(6.93)),
                stats("Utilities", 0.0, Some(0.0), None),
            ],
            rankings: vec![
                SectorRanking {
                    sector: "Technology".to_string(),
                    risk_adjusted_score: Some(1.294),
                    overall_rank: Some(1.0),
                },
                SectorRanking {
                    sector: "Utilities".to_string(),
                    risk_adjusted_score: None,
                    overall_rank: None,
                },
            ],
            leaders: Leaders {
                best_return: Some(Leader {
                    sector: "Technology".to_string(),
                    value: 1.98,
                }),
                worst_return: Some(Leader {
                    sector: "Utilities".to_string(),
                    value: 0.0,
                }),
                best_sharpe: Some(Leader {
                    sector: "Technology".to_string(),
                    value: 6.93,
                }),
                lowest_volatility: Some(Leader {
                    sector: "Utilities".to_string(),
                    value: 0.0,
                }),
            },
            correlation: CorrelationMatrix {
                sectors: vec!["Technology".to_string(), "Utilities".to_string()],
                values: vec![vec![Some(1.0), None], vec![None, Some(1.0)]],
            },
            alerts: vec![],
        }
    }

    fn window() -> DateWindow {
        DateWindow::trailing(Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap(), 365).unwrap()
    }

    #[test]
    fn test_render_sections() {
        let text = ConsoleReport::render(&sample_analysis(), &window(), 2);
        assert!(text.contains("Analysis period: 2024-01-09 to 2025-01-08"));
        assert!(text.contains("Utilities: 2/3 stocks analyzed (missing: XXXX)"));
        assert!(text.contains("Ghost: 0/1 stocks analyzed (excluded, no price data)"));
        assert!(text.contains("SECTOR PERFORMANCE SUMMARY"));
        assert!(text.contains("Growth pick:    Technology"));
        assert!(text.contains("Defensive pick: Utilities"));
        assert!(text.contains("All sectors show good diversification potential"));
        assert!(text.contains("Past performance doesn't guarantee future results"));
    }

    #[test]
    fn test_undefined_values_print_na() {
        let text = ConsoleReport::render(&sample_analysis(), &window(), 2);
        let utilities_row = text
            .lines()
            .find(|l| l.contains("Utilities") && l.contains("n/a"))
            .unwrap();
        assert!(utilities_row.contains("0.00"));
    }

    #[test]
    fn test_alerts_listed() {
        let mut analysis = sample_analysis();
        analysis.alerts.push(DiversificationAlert {
            first: "Technology".to_string(),
            second: "Utilities".to_string(),
            correlation: 0.8512,
        });
        let text = ConsoleReport::render(&analysis, &window(), 2);
        assert!(text.contains("DIVERSIFICATION ALERT (correlation above 0.70)"));
        assert!(text.contains("Technology and Utilities are highly correlated (0.85)"));
        assert!(!text.contains("good diversification potential"));
    }

    /// Accepts a fixed number of bytes, then refuses.
    struct Bounded {
        room: usize,
        written: String,
    }

    impl std::fmt::Write for Bounded {
        fn write_str(&mut self, s: &str) -> std::fmt::Result {
            if s.len() > self.room {
                return Err(std::fmt::Error);
            }
            self.room -= s.len();
            self.written.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn test_writer_errors_stop_the_report() {
        use std::fmt::Write;

        let analysis = sample_analysis();
        let window = window();
        let report = ConsoleReport::new(&analysis, &window, 2);
        assert_eq!(report.to_string(), ConsoleReport::render(&analysis, &window, 2));

        let mut sink = Bounded {
            room: 200,
            written: String::new(),
        };
        assert!(write!(sink, "{}", report).is_err());
        assert!(sink.written.starts_with("===="));
        assert!(!sink.written.contains("Key takeaways"));
    }
}
