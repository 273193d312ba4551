//! Display helpers for loosely typed page props

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Render a scalar prop as text; `None` for null, missing or empty
pub fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Unix seconds (checkouts) or RFC 3339 (payments) as a short UTC string
pub fn timestamp(value: &Value, key: &str) -> Option<String> {
    let time: DateTime<Utc> = match value.get(key)? {
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?,
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        _ => return None,
    };
    Some(time.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// Pretty JSON for metadata blocks
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text() {
        let v = json!({"id": 3, "status": "paid", "empty": "", "none": null});
        assert_eq!(text(&v, "id").as_deref(), Some("3"));
        assert_eq!(text(&v, "status").as_deref(), Some("paid"));
        assert_eq!(text(&v, "empty"), None);
        assert_eq!(text(&v, "none"), None);
        assert_eq!(text(&v, "missing"), None);
    }

    #[test]
    fn test_timestamp() {
        let v = json!({"unix": 1_703_144_567, "rfc": "2023-12-21T07:42:47Z"});
        assert_eq!(timestamp(&v, "unix").as_deref(), Some("2023-12-21 07:42 UTC"));
        assert_eq!(timestamp(&v, "rfc").as_deref(), Some("2023-12-21 07:42 UTC"));
    }
}
