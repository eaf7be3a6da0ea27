//! Date-time handling for gateway payloads.
//!
//! The gateway reports payment and expiry times as naive local date-times
//! in the form `YYYY-MM-DD HH:MM:SS`, without a zone offset.

use chrono::{Local, NaiveDateTime};

/// Format of date-time strings sent by the gateway.
pub const GATEWAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a gateway date-time string.
///
/// Returns `None` if `value` does not match [`GATEWAY_DATETIME_FORMAT`].
#[must_use]
pub fn parse_gateway_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, GATEWAY_DATETIME_FORMAT).ok()
}

/// Parses a payment time, falling back to the current local time when the
/// value is missing or malformed.
#[must_use]
pub fn parse_pay_time(value: Option<&str>) -> NaiveDateTime {
    value
        .and_then(parse_gateway_datetime)
        .unwrap_or_else(|| Local::now().naive_local())
}
