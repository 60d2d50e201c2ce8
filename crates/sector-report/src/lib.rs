//! Console, chart and JSON output for a finished sector analysis.

pub mod charts;
pub mod console;
pub mod error;
pub mod json;

pub use console::ConsoleReport;
pub use error::ReportError;
pub use json::{write_report, JsonReport};

use sector_analysis::round_to;

/// Rounded fixed-point text, never printing `-0.00`.
pub fn fmt_num(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, round_to(value, precision))
}

/// Like [`fmt_num`], printing `n/a` for undefined values.
pub fn fmt_opt(value: Option<f64>, precision: u32) -> String {
    match value {
        Some(v) if v.is_finite() => fmt_num(v, precision),
        _ => "n/a".to_string(),
    }
}
