//! Fence types, directions, time windows and the persisted descriptor.
//!
//! Provides the value types that flow from the annotation tool to a fence
//! store, plus the parsing rules for the loosely-typed values a backend
//! hands back.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::geometry::FractionalPoint;
use crate::types::{CameraId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a fence name, in characters.
pub const MAX_FENCE_NAME_LENGTH: usize = 100;

/// Placeholder the backend uses for an unset clock time.
pub const UNSET_TIME: &str = "--:--";

/// Clock format used on the wire.
const CLOCK_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// FenceType
// ---------------------------------------------------------------------------

/// Kind of fence, selecting the detection function it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FenceType {
    /// One-way entry/exit gate.
    Gate,
    Intrusion,
    /// People-counting line.
    Crowd,
    People,
}

const VALID_FENCE_TYPES: &[&str] = &["gate", "inout", "intrusion", "crowd", "people"];

impl FenceType {
    pub const ALL: [FenceType; 4] = [Self::Gate, Self::Intrusion, Self::Crowd, Self::People];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::Intrusion => "intrusion",
            Self::Crowd => "crowd",
            Self::People => "people",
        }
    }

    /// Path segment used by the REST backend (`/api/fence/{segment}`).
    pub fn route_segment(&self) -> &'static str {
        match self {
            Self::Gate => "inout",
            other => other.as_str(),
        }
    }

    /// Counting fences run continuously and carry no time window.
    pub fn supports_time_window(&self) -> bool {
        matches!(self, Self::Gate | Self::Intrusion)
    }

    /// Stroke colour for the drawn line.
    pub fn line_color(&self) -> &'static str {
        match self {
            Self::Gate => "#00a8ff",
            _ => "#e67e22",
        }
    }
}

impl FromStr for FenceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gate" | "inout" => Ok(Self::Gate),
            "intrusion" => Ok(Self::Intrusion),
            "crowd" => Ok(Self::Crowd),
            "people" => Ok(Self::People),
            _ => Err(CoreError::Validation(format!(
                "Invalid fence type '{s}'. Must be one of: {}",
                VALID_FENCE_TYPES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for FenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Allowed crossing direction, relative to the endpoint labels A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtoB => "AtoB",
            Self::BtoA => "BtoA",
        }
    }

    /// Arrow form for display (`A → B`).
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::AtoB => "A → B",
            Self::BtoA => "B → A",
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    /// Accepts every spelling the stored data has used over time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ATOB" | "A->B" | "A-B" | "AB" | "1" => Ok(Self::AtoB),
            "BTOA" | "B->A" | "B-A" | "BA" | "-1" => Ok(Self::BtoA),
            _ => Err(CoreError::Validation(format!(
                "Invalid direction '{s}'. Must be AtoB or BtoA"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Clock times
// ---------------------------------------------------------------------------

/// Parse a wall-clock time as sent by the backend.
///
/// Accepts `HH:MM` and `HH:MM:SS` (seconds dropped). Empty strings and the
/// [`UNSET_TIME`] placeholder yield `Ok(None)`.
pub fn parse_clock(s: &str) -> Result<Option<NaiveTime>, CoreError> {
    let s = s.trim();
    if s.is_empty() || s == UNSET_TIME {
        return Ok(None);
    }
    NaiveTime::parse_from_str(s, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(|t| t.with_second(0).unwrap_or(t))
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("Invalid time '{s}'. Expected HH:MM")))
}

/// Format an optional clock time the way the backend displays it.
pub fn format_clock(t: Option<NaiveTime>) -> String {
    match t {
        Some(t) => t.format(CLOCK_FORMAT).to_string(),
        None => UNSET_TIME.to_string(),
    }
}

/// Serde adapter for `Option<NaiveTime>` as `"HH:MM"` / `null`.
pub mod clock_opt {
    use super::*;

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format(CLOCK_FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(raw) => parse_clock(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// Daily window during which a fence or detection mode is active.
///
/// `start > end` denotes a window that runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a window from two clock strings. Both must be set or both
    /// unset; a half-specified window is a validation error.
    pub fn parse(start: &str, end: &str) -> Result<Option<Self>, CoreError> {
        match (parse_clock(start)?, parse_clock(end)?) {
            (Some(start), Some(end)) => Ok(Some(Self { start, end })),
            (None, None) => Ok(None),
            _ => Err(CoreError::Validation(
                "time window needs both a start and an end time".to_string(),
            )),
        }
    }

    /// The whole day, used when a mode has no stored schedule.
    pub fn all_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `t` falls inside the window, both ends inclusive.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.is_overnight() {
            t >= self.start || t <= self.end
        } else {
            t >= self.start && t <= self.end
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            self.start.format(CLOCK_FORMAT),
            self.end.format(CLOCK_FORMAT)
        )
    }
}

// ---------------------------------------------------------------------------
// FenceMetadata
// ---------------------------------------------------------------------------

/// Operator-supplied form values completing a drawn line.
#[derive(Debug, Clone, PartialEq)]
pub struct FenceMetadata {
    pub name: String,
    pub direction: Direction,
    pub time_window: Option<TimeWindow>,
}

impl FenceMetadata {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
            time_window: None,
        }
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    /// Validate the form against the fence type it will be saved under.
    pub fn validate(&self, fence_type: FenceType) -> Result<(), CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("fence name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_FENCE_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "fence name must be at most {MAX_FENCE_NAME_LENGTH} characters"
            )));
        }
        if self.time_window.is_some() && !fence_type.supports_time_window() {
            return Err(CoreError::Validation(format!(
                "{fence_type} fences do not take a time window"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FenceDescriptor
// ---------------------------------------------------------------------------

/// A finalized fence as submitted to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FenceDescriptor {
    pub camera_id: CameraId,
    #[serde(rename = "type")]
    pub fence_type: FenceType,
    pub name: String,
    pub direction: Direction,
    pub point_a: FractionalPoint,
    pub point_b: FractionalPoint,
    #[serde(rename = "start_time", with = "clock_opt", default)]
    pub time_start: Option<NaiveTime>,
    #[serde(rename = "end_time", with = "clock_opt", default)]
    pub time_end: Option<NaiveTime>,
    pub created_at: Timestamp,
}

impl FenceDescriptor {
    pub fn time_window(&self) -> Option<TimeWindow> {
        match (self.time_start, self.time_end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FenceSummary
// ---------------------------------------------------------------------------

/// Read-only fence record as listed by a store.
///
/// Fields stay loosely typed because stored rows predate the current
/// direction spelling and may hold the [`UNSET_TIME`] placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FenceSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub direction: String,
    #[serde(default = "unset_time")]
    pub start_time: String,
    #[serde(default = "unset_time")]
    pub end_time: String,
}

fn unset_time() -> String {
    UNSET_TIME.to_string()
}

impl FenceSummary {
    /// Parsed direction, if the stored value is recognisable.
    pub fn direction(&self) -> Option<Direction> {
        self.direction.parse().ok()
    }

    /// Parsed active window; malformed stored times count as unset.
    pub fn time_window(&self) -> Option<TimeWindow> {
        TimeWindow::parse(&self.start_time, &self.end_time).ok().flatten()
    }
}

impl fmt::Display for FenceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{}~{}]",
            self.name, self.direction, self.start_time, self.end_time
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
