//! Read-side rendering of audit rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Headers and body of one side of an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub headers: Value,
    pub body: Value,
}

/// One audit row as returned by the query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRecord {
    pub id: i64,
    pub username: Option<String>,
    pub path: String,
    pub domain: Option<String>,
    pub method: String,
    pub status_code: Option<i64>,
    pub ip: String,
    pub user_agent: Option<String>,
    pub request: Exchange,
    pub response: Exchange,
    pub api_date: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    /// Seconds between insert and completion.
    pub time: Option<f64>,
}

/// Decode a stored JSON text field. Null, empty or malformed content reads
/// as an empty mapping.
pub fn decode_json_field(raw: Option<&str>) -> Value {
    let empty = || Value::Object(Map::new());
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return empty();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => empty(),
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "stored JSON field is malformed, rendering as empty");
            empty()
        }
    }
}

/// Stored form of a timestamp: UTC at second precision, in the same
/// `YYYY-MM-DD HH:MM:SS` shape rendered to clients, so a rendered value
/// can be used as an equality filter.
pub fn store_timestamp(ts: jiff::Timestamp) -> String {
    ts.strftime(DISPLAY_FORMAT).to_string()
}

/// Parse a stored timestamp. RFC 3339 text is accepted as well.
pub fn parse_timestamp(raw: &str) -> Option<jiff::Timestamp> {
    if let Ok(civil) = jiff::civil::DateTime::strptime(DISPLAY_FORMAT, raw.trim()) {
        return civil.to_zoned(jiff::tz::TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    raw.parse().ok()
}

/// `YYYY-MM-DD HH:MM:SS` in UTC. Unparseable input is returned unchanged.
pub fn display_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.strftime(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Seconds from `created` to `updated`, when both parse.
pub fn elapsed_seconds(created: &str, updated: &str) -> Option<f64> {
    let created = parse_timestamp(created)?;
    let updated = parse_timestamp(updated)?;
    Some(updated.duration_since(created).as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_stored_json() {
        assert_eq!(decode_json_field(Some("{\"a\":1}")), json!({ "a": 1 }));
        assert_eq!(decode_json_field(Some("[1,2]")), json!([1, 2]));
    }

    #[test]
    fn null_empty_and_malformed_read_as_empty_mapping() {
        for raw in [None, Some(""), Some("  "), Some("null"), Some("{not json")] {
            assert_eq!(decode_json_field(raw), json!({}), "{raw:?}");
        }
    }

    #[test]
    fn stored_timestamps_match_their_rendering() {
        let ts: jiff::Timestamp = "2026-10-17T08:09:10.5Z".parse().unwrap();
        let stored = store_timestamp(ts);
        assert_eq!(stored, "2026-10-17 08:09:10");
        assert_eq!(display_timestamp(&stored), stored);
        assert_eq!(
            parse_timestamp(&stored),
            Some("2026-10-17T08:09:10Z".parse().unwrap())
        );
    }

    #[test]
    fn rfc3339_text_still_parses() {
        assert_eq!(display_timestamp("2026-10-17T08:09:10.5Z"), "2026-10-17 08:09:10");
    }

    #[test]
    fn elapsed_is_in_seconds() {
        let secs = elapsed_seconds("2026-10-17T08:00:00Z", "2026-10-17T08:00:01.5Z").unwrap();
        assert!((secs - 1.5).abs() < f64::EPSILON);
        assert_eq!(elapsed_seconds("garbage", "2026-10-17T08:00:00Z"), None);
    }
}
