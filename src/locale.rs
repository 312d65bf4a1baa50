//! Fixed-locale formatting for numbers shown to the learner.

use crate::clock::Timestamp;
use chrono::{Local, TimeZone};
use itertools::Itertools;

/// Integer with `,` between groups of three digits
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let grouped = digits
        .chars()
        .rev()
        .chunks(3)
        .into_iter()
        .map(|chunk| chunk.collect::<String>())
        .join(",")
        .chars()
        .rev()
        .collect::<String>();

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Ratio in `0.0..=1.0` as a whole percentage, e.g. `95%`
pub fn format_percent(rate: f64) -> String {
    format!("{}%", (rate * 100.0).round() as i64)
}

/// Milliseconds as whole seconds
pub fn format_whole_seconds(millis: i64) -> String {
    format_count((millis as f64 / 1000.0).round() as i64)
}

/// Milliseconds as seconds with at most one decimal, e.g. `2.1` or `3`
pub fn format_seconds(millis: f64) -> String {
    let tenths = (millis / 100.0).round() as i64;
    if tenths % 10 == 0 {
        format_count(tenths / 10)
    } else {
        format!("{}.{}", format_count(tenths / 10), (tenths % 10).abs())
    }
}

/// Local date and time for a history timestamp
pub fn format_timestamp(at: Timestamp) -> String {
    match Local.timestamp_millis_opt(at).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}
