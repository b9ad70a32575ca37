//! Timestamp decoding for backend responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};

/// Parse an ISO-8601 timestamp
///
/// RFC 3339 is tried first (it covers values with and without fractional
/// seconds); basic-format offsets such as `+0100` are accepted as a fallback.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for optional timestamps; `null` and absent map to `None`
pub(crate) fn optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_timestamp(&raw).map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
        })
        .transpose()
}
