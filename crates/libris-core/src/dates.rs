//! # Wire Dates
//!
//! Servers in the wild send either full RFC 3339 timestamps
//! (`2024-03-01T10:15:00.000Z`) or bare calendar dates (`2024-03-01`).
//! Everything is normalised to `DateTime<Utc>`; bare dates become midnight UTC.
//! Output is always RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date.
///
/// ## Example
/// ```rust
/// use libris_core::dates::parse_flexible;
///
/// assert!(parse_flexible("2024-03-01T10:15:00Z").is_some());
/// assert!(parse_flexible("2024-03-01").is_some());
/// assert!(parse_flexible("yesterday").is_none());
/// ```
pub fn parse_flexible(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp as a calendar date for tables (`2024-03-01`).
pub fn display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// `#[serde(with = "libris_core::dates::flexible")]`
pub mod flexible {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_flexible(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }
}

/// Same as [`flexible`] for nullable fields (`returnDate: null`).
pub mod flexible_option {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_some(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_flexible(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_millis() {
        let dt = parse_flexible("2024-03-01T10:15:30.123Z").unwrap();
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let dt = parse_flexible("2024-03-01").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(display_date(&dt), "2024-03-01");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_flexible("").is_none());
        assert!(parse_flexible("03/01/2024").is_none());
    }
}
