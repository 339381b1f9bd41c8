//! Query parameter types with readable parse errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// A UTC timestamp accepted in several shapes:
///
/// - RFC 3339: `2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+02:00`
/// - ISO 8601 without offset, read as UTC: `2024-01-15T10:30:00`
/// - Date only, read as midnight UTC: `2024-01-15`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleDateTime(pub DateTime<Utc>);

impl From<FlexibleDateTime> for DateTime<Utc> {
    fn from(dt: FlexibleDateTime) -> Self {
        dt.0
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

fn parse_flexible_datetime(s: &str) -> Result<FlexibleDateTime, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(
            "Date value cannot be empty. Expected ISO 8601 (e.g. '2024-01-15T10:30:00Z' or '2024-01-15')"
                .to_string(),
        );
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(FlexibleDateTime(dt.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(FlexibleDateTime(naive.and_utc()));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(FlexibleDateTime(midnight.and_utc()));
    }

    Err(format!(
        "Invalid date '{}'. Expected ISO 8601 (e.g. '2024-01-15T10:30:00Z' or '2024-01-15')",
        s
    ))
}
