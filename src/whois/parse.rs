//! WHOIS response parsing.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{WhoisApiResponse, WhoisRecord};

/// Timestamps above this are taken as milliseconds (year 33658 in seconds).
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

pub(crate) fn convert_response(response: &WhoisApiResponse) -> WhoisRecord {
    WhoisRecord {
        registrar: response.registrar.as_ref().and_then(parse_registrar),
        expires_at: response.expiration_date.as_ref().and_then(parse_expiry),
    }
}

/// First non-empty registrar name in a string or array value.
fn parse_registrar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Array(items) => items.iter().find_map(parse_registrar),
        _ => None,
    }
}

/// Parses an expiry given as a date string, a Unix timestamp (seconds or
/// milliseconds), or an array of those. Arrays yield the first parseable
/// entry.
pub(crate) fn parse_expiry(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(parse_timestamp),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(ts) => parse_timestamp(ts),
                Err(_) => parse_date_string(trimmed),
            }
        }
        Value::Array(items) => items.iter().find_map(parse_expiry),
        _ => None,
    }
}

fn parse_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    if ts <= 0 {
        return None;
    }
    if ts > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

/// Attempts to parse a date string in various formats
pub(crate) fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // Try common WHOIS date formats
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%d/%m/%Y",
    ];

    for format in &formats {
        if let Ok(naive_dt) = chrono::NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive_dt.and_utc());
        }
        if let Ok(naive_date) = chrono::NaiveDate::parse_from_str(date_str, format) {
            return Some(naive_date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
