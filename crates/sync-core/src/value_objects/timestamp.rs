//! Wire timestamp format
//!
//! All timestamps cross the wire as UTC ISO-8601 with millisecond precision
//! (`yyyy-MM-ddTHH:mm:ss.fffZ`), the format the records were written with
//! historically. Internal code keeps `DateTime<Utc>`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Wire timestamp format string
pub const ISO_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a timestamp in the wire format
pub fn format_millis(ts: &DateTime<Utc>) -> String {
    ts.format(ISO_MILLIS_FORMAT).to_string()
}

/// Parse a wire-format timestamp
pub fn parse_millis(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, ISO_MILLIS_FORMAT).map(|naive| naive.and_utc())
}

/// Serde adapter for `#[serde(with = "iso_millis")]` fields
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_millis(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_millis(&s).map_err(serde::de::Error::custom)
    }
}
