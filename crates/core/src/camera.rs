//! Camera directory records and detection-mode schedules.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::fence::TimeWindow;
use crate::types::CameraId;

// ---------------------------------------------------------------------------
// DetectionMode
// ---------------------------------------------------------------------------

/// Per-camera detection modes that are toggled and scheduled as a whole,
/// independent of any drawn fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    Falling,
    Climbing,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Falling => "falling",
            Self::Climbing => "climbing",
        }
    }
}

impl FromStr for DetectionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "falling" | "fall" => Ok(Self::Falling),
            "climbing" | "climb" => Ok(Self::Climbing),
            _ => Err(CoreError::Validation(format!(
                "Invalid detection mode '{s}'. Must be one of: falling, climbing"
            ))),
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Camera records
// ---------------------------------------------------------------------------

/// Entry of the camera list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub camera_id: CameraId,
    pub camera_name: String,
    /// Video file or stream URL backing the feed.
    pub camera_url: String,
}

/// Stored start/end pair of a mode schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start: String,
    pub end: String,
}

/// Full camera record including detection-mode flags and schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub camera_id: CameraId,
    pub camera_name: String,
    pub camera_url: String,
    #[serde(default, deserialize_with = "flag_from_bool_or_int")]
    pub falling_detection_mode: bool,
    #[serde(default, deserialize_with = "flag_from_bool_or_int")]
    pub climbing_detection_mode: bool,
    #[serde(default)]
    pub schedules: HashMap<String, ScheduleEntry>,
}

impl CameraRecord {
    pub fn mode_enabled(&self, mode: DetectionMode) -> bool {
        match mode {
            DetectionMode::Falling => self.falling_detection_mode,
            DetectionMode::Climbing => self.climbing_detection_mode,
        }
    }

    /// Active window for `mode`, falling back to the whole day when none
    /// is stored or the stored one is unreadable.
    pub fn schedule_for(&self, mode: DetectionMode) -> TimeWindow {
        self.schedules
            .get(mode.as_str())
            .and_then(|entry| TimeWindow::parse(&entry.start, &entry.end).ok().flatten())
            .unwrap_or_else(TimeWindow::all_day)
    }
}

/// SQL backends hand out integer ids; document stores hand out strings.
fn id_from_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<CameraId, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "camera id must be a string or number, got {other}"
        ))),
    }
}

/// MySQL booleans arrive as `0` / `1`.
fn flag_from_bool_or_int<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected boolean flag, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
