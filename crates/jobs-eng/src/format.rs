//! Display formatting for epoch-millisecond timestamps.
//!
//! The same representation is used on the dashboard and as the comparison
//! key of the deploy-status feed, so it must stay stable.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use serde_json::Value;

/// Zone every timestamp is displayed in.
pub const DISPLAY_TIME_ZONE: Tz = chrono_tz::Europe::Rome;

const DAY_MONTH_FORMAT: &str = "%d/%m";
const CLOCK_FORMAT: &str = "%H:%M:%S";

/// Rendered in place of timestamps that cannot be represented.
pub const INVALID_DATE: &str = "Invalid Date";

/// Largest magnitude accepted as a date, 100 million days either side of the epoch.
const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

/// `dd/mm/yyyy, HH:MM:SS` on a 24-hour clock.
///
/// The year is written as a plain number, without padding or a leading `+`.
pub fn format_timestamp(millis: i64) -> String {
    if millis.unsigned_abs() > MAX_EPOCH_MILLIS as u64 {
        return INVALID_DATE.to_string();
    }
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => {
            let local = utc.with_timezone(&DISPLAY_TIME_ZONE);
            format!(
                "{}/{}, {}",
                local.format(DAY_MONTH_FORMAT),
                local.year(),
                local.format(CLOCK_FORMAT)
            )
        }
        None => INVALID_DATE.to_string(),
    }
}

/// Display form of a `lastTime` style threshold; unparsable input is `Invalid Date`.
pub fn format_threshold(raw: &str) -> String {
    match parse_millis(raw) {
        Some(millis) => format_timestamp(millis),
        None => INVALID_DATE.to_string(),
    }
}

/// Format a raw JSON `timestamp` field, whatever shape it arrived in.
pub fn format_timestamp_value(value: &Value) -> String {
    match millis_from_value(value) {
        Some(millis) => format_timestamp(millis),
        None => INVALID_DATE.to_string(),
    }
}

/// Interpret a JSON number or numeric string as epoch millis.
pub fn millis_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(millis_from_f64)),
        Value::String(s) => parse_millis(s),
        _ => None,
    }
}

/// Parse a query-string or body value such as `"1700000000000"`.
pub fn parse_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(millis_from_f64))
}

fn millis_from_f64(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() > MAX_EPOCH_MILLIS as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}
