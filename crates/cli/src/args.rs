//! Command-line surface of the `gatewatch` binary.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use gatewatch_core::camera::DetectionMode;
use gatewatch_core::fence::{Direction, FenceType};
use gatewatch_core::geometry::{FrameSize, PixelPoint};

#[derive(Parser, Debug)]
#[command(name = "gatewatch", about = "Camera fence annotation and alert history client")]
pub struct Cli {
    /// Print JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List cameras.
    Cameras,
    /// Show one camera with its detection modes and schedules.
    Camera { camera_id: String },
    /// List the fences of one type on a camera.
    Fences {
        camera_id: String,
        #[arg(long = "type", value_parser = parse_fence_type, default_value = "gate")]
        fence_type: FenceType,
    },
    /// Draw a fence from two clicks on a frame and submit it.
    Draw(DrawArgs),
    /// Turn a detection mode on or off.
    Mode {
        camera_id: String,
        #[arg(value_parser = parse_mode)]
        mode: DetectionMode,
        state: Toggle,
    },
    /// Set the daily window of a detection mode.
    Schedule {
        camera_id: String,
        #[arg(value_parser = parse_mode)]
        mode: DetectionMode,
        /// Start time, `HH:MM`.
        start: String,
        /// End time, `HH:MM`. Earlier than start means overnight.
        end: String,
    },
    /// Query past alerts.
    Events(EventArgs),
    /// Delete a fence (not supported by any backend).
    DeleteFence {
        camera_id: String,
        #[arg(long = "type", value_parser = parse_fence_type, default_value = "gate")]
        fence_type: FenceType,
        fence_id: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

#[derive(Args, Debug, Clone)]
pub struct DrawArgs {
    pub camera_id: String,
    #[arg(long = "type", value_parser = parse_fence_type, default_value = "gate")]
    pub fence_type: FenceType,
    /// Rendered frame size the clicks refer to, `WIDTHxHEIGHT`.
    #[arg(long, value_parser = parse_frame)]
    pub frame: FrameSize,
    /// Click position in display pixels, `X,Y`. First click is endpoint A.
    #[arg(long = "click", value_parser = parse_point, required = true)]
    pub clicks: Vec<PixelPoint>,
    #[arg(long)]
    pub name: String,
    #[arg(long, value_parser = parse_direction, default_value = "AtoB")]
    pub direction: Direction,
    /// Active from, `HH:MM` (gate and intrusion fences only).
    #[arg(long, requires = "end")]
    pub start: Option<String>,
    /// Active until, `HH:MM`.
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// First day, `YYYY-MM-DD`.
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    /// Last day, `YYYY-MM-DD`, inclusive.
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    #[arg(long = "type")]
    pub event_type: Option<String>,
    #[arg(long)]
    pub level: Option<String>,
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

pub fn parse_fence_type(s: &str) -> Result<FenceType, String> {
    s.parse().map_err(|e: gatewatch_core::error::CoreError| e.to_string())
}

pub fn parse_direction(s: &str) -> Result<Direction, String> {
    s.parse().map_err(|e: gatewatch_core::error::CoreError| e.to_string())
}

pub fn parse_mode(s: &str) -> Result<DetectionMode, String> {
    s.parse().map_err(|e: gatewatch_core::error::CoreError| e.to_string())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_frame(s: &str) -> Result<FrameSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid frame '{s}', expected WIDTHxHEIGHT"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    let frame = FrameSize::new(width, height);
    if !frame.has_area() {
        return Err(format!("frame '{s}' has no area"));
    }
    Ok(frame)
}

/// Parse `X,Y`.
pub fn parse_point(s: &str) -> Result<PixelPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("invalid point '{s}', expected X,Y"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x '{x}'"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y '{y}'"))?;
    Ok(PixelPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_forms() {
        assert_eq!(parse_frame("400x200").unwrap(), FrameSize::new(400.0, 200.0));
        assert_eq!(parse_frame("1280X720").unwrap(), FrameSize::new(1280.0, 720.0));
        assert!(parse_frame("400").is_err());
        assert!(parse_frame("0x200").is_err());
    }

    #[test]
    fn point_forms() {
        assert_eq!(parse_point("100, 50.5").unwrap(), PixelPoint::new(100.0, 50.5));
        assert!(parse_point("100;50").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn date_form() {
        assert_eq!(parse_date("2025-10-14").unwrap(), NaiveDate::from_ymd_opt(2025, 10, 14).unwrap());
        assert!(parse_date("14/10/2025").is_err());
    }
}
