//! Alert history queries and records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Placeholder shown for a missing camera or gate name.
pub const MISSING_NAME: &str = "—";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// EventQuery
// ---------------------------------------------------------------------------

/// Filters for the alert history. Every filter is optional; dates are whole
/// days, inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub level: Option<String>,
}

impl EventQuery {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Query-string pairs in the backend's parameter names. Empty filters
    /// are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start {
            pairs.push(("start", format!("{} 00:00:00", start.format("%Y-%m-%d"))));
        }
        if let Some(end) = self.end {
            pairs.push(("end", format!("{} 23:59:59", end.format("%Y-%m-%d"))));
        }
        if let Some(t) = self.event_type.as_deref().filter(|t| !t.trim().is_empty()) {
            pairs.push(("type", t.trim().to_string()));
        }
        if let Some(l) = self.level.as_deref().filter(|l| !l.trim().is_empty()) {
            pairs.push(("level", l.trim().to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// AlertEvent
// ---------------------------------------------------------------------------

/// One past alert as listed by the history service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub event_id: i64,
    #[serde(default)]
    pub camera_name: Option<String>,
    #[serde(default)]
    pub gate_name: Option<String>,
    pub event_type: String,
    pub alert_level: String,
    /// Raw timestamp as sent by the backend.
    pub timestamp: String,
}

impl AlertEvent {
    pub fn camera_label(&self) -> &str {
        self.camera_name.as_deref().unwrap_or(MISSING_NAME)
    }

    pub fn gate_label(&self) -> &str {
        self.gate_name.as_deref().unwrap_or(MISSING_NAME)
    }

    /// Timestamp as `YYYY-MM-DD HH:MM:SS`, or the raw value if it matches
    /// none of the known formats.
    pub fn display_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Normalise a backend timestamp for display.
///
/// Understands RFC 3339, RFC 2822 (what `jsonify` emits for datetimes) and
/// plain `YYYY-MM-DD HH:MM:SS`. Unknown shapes come back unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(DISPLAY_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw.replace(" GMT", " +0000").as_str()) {
        return dt.naive_utc().format(DISPLAY_FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DISPLAY_FORMAT) {
        return dt.format(DISPLAY_FORMAT).to_string();
    }
    raw.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn query_pairs_expand_whole_days() {
        let q = EventQuery {
            start: Some(day("2025-10-01")),
            end: Some(day("2025-10-02")),
            event_type: Some("intrusion".into()),
            level: None,
        };
        assert_eq!(
            q.to_query_pairs(),
            vec![
                ("start", "2025-10-01 00:00:00".to_string()),
                ("end", "2025-10-02 23:59:59".to_string()),
                ("type", "intrusion".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_has_no_pairs() {
        assert!(EventQuery::default().to_query_pairs().is_empty());
    }

    #[test]
    fn blank_filters_omitted() {
        let q = EventQuery {
            level: Some("  ".into()),
            ..Default::default()
        };
        assert!(q.to_query_pairs().is_empty());
    }

    #[test]
    fn inverted_range_rejected() {
        let q = EventQuery {
            start: Some(day("2025-10-05")),
            end: Some(day("2025-10-01")),
            ..Default::default()
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn same_day_range_accepted() {
        let q = EventQuery {
            start: Some(day("2025-10-05")),
            end: Some(day("2025-10-05")),
            ..Default::default()
        };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(format_timestamp("2025-10-14T08:05:09Z"), "2025-10-14 08:05:09");
        assert_eq!(
            format_timestamp("Tue, 14 Oct 2025 08:05:09 GMT"),
            "2025-10-14 08:05:09"
        );
        assert_eq!(format_timestamp("2025-10-14 08:05:09"), "2025-10-14 08:05:09");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn missing_names_use_placeholder() {
        let e = AlertEvent {
            event_id: 1,
            camera_name: None,
            gate_name: Some("north".into()),
            event_type: "intrusion".into(),
            alert_level: "high".into(),
            timestamp: "2025-10-14 08:05:09".into(),
        };
        assert_eq!(e.camera_label(), MISSING_NAME);
        assert_eq!(e.gate_label(), "north");
    }
}
