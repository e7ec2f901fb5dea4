//! Custom query parameter types with improved error handling.
//!
//! This module provides wrapper types for query and form parameters
//! that give user-friendly error messages instead of cryptic
//! deserialization failures.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// A DateTime type that provides helpful error messages when parsing
/// fails.
///
/// Accepts:
/// - RFC 3339 with timezone: `2026-01-15T10:30:00Z`
/// - RFC 3339 with offset: `2026-01-15T10:30:00+00:00`
/// - ISO 8601 without timezone (assumes UTC): `2026-01-15T10:30:00`
/// - `datetime-local` form values (no seconds): `2026-01-15T10:30`
/// - Date only (assumes midnight UTC): `2026-01-15`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleDateTime(pub DateTime<Utc>);

impl std::str::FromStr for FlexibleDateTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_flexible_datetime(s)
    }
}

impl<'de> Deserialize<'de> for FlexibleDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_flexible_datetime(&s).map_err(de::Error::custom)
    }
}

/// Parse a datetime string with multiple format support and helpful
/// errors.
pub fn parse_flexible_datetime(s: &str) -> Result<FlexibleDateTime, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(
            "Date value cannot be empty. Expected ISO 8601 format (e.g., '2026-01-15T10:30:00Z' or '2026-01-15')"
                .to_string(),
        );
    }

    // RFC 3339 with timezone or offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(FlexibleDateTime(dt.with_timezone(&Utc)));
    }

    // ISO 8601 without timezone, with or without seconds (the latter
    // is what <input type="datetime-local"> submits)
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(FlexibleDateTime(naive.and_utc()));
        }
    }

    // Date only, midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("Failed to convert '{}' to a datetime", s))?;
        return Ok(FlexibleDateTime(midnight.and_utc()));
    }

    Err(format!(
        "Invalid date '{}'. Expected ISO 8601 (e.g., '2026-01-15T10:30:00Z', '2026-01-15T10:30', or '2026-01-15')",
        s
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_rfc3339_with_zone() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.0.hour(), 10);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt.0.hour(), 8);
    }

    #[test]
    fn test_naive_iso_assumes_utc() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00").unwrap();
        assert_eq!(dt.0.hour(), 10);
    }

    #[test]
    fn test_datetime_local_without_seconds() {
        let dt = parse_flexible_datetime("2026-01-15T10:30").unwrap();
        assert_eq!(dt.0.hour(), 10);
        assert_eq!(dt.0.minute(), 30);
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        let dt = parse_flexible_datetime("2026-01-15").unwrap();
        assert_eq!(dt.0.hour(), 0);
        assert_eq!(dt.0.minute(), 0);
    }

    #[test]
    fn test_empty_is_rejected_with_hint() {
        let err = parse_flexible_datetime("  ").unwrap_err();
        assert!(err.contains("ISO 8601"));
    }

    #[test]
    fn test_garbage_is_rejected_with_value_in_message() {
        let err = parse_flexible_datetime("next tuesday").unwrap_err();
        assert!(err.contains("next tuesday"));
    }

    #[test]
    fn test_deserialize_in_struct() {
        #[derive(Debug, Deserialize)]
        struct Query {
            date_from: Option<FlexibleDateTime>,
        }

        let q: Query = serde_json::from_str(r#"{"date_from": "2026-01-15"}"#).unwrap();
        assert!(q.date_from.is_some());

        let err = serde_json::from_str::<Query>(r#"{"date_from": "nope"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }
}
