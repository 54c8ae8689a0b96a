//! Coordinate spaces and line geometry for fence annotation.
//!
//! Two coordinate spaces exist and are kept apart by type:
//!
//! - [`PixelPoint`]: display pixels relative to the top-left corner of the
//!   rendered frame. Only meaningful together with the [`FrameSize`] the
//!   frame had when it was frozen.
//! - [`FractionalPoint`]: `(x / width, y / height)`, each component in
//!   `[0, 1]`. This is what gets persisted, because the backend enforces
//!   fences on frames of a different resolution than the one drawn on.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Distance in display pixels between the line midpoint and each endpoint
/// label.
pub const LABEL_OFFSET_PX: f64 = 25.0;

/// Radius in display pixels of the marker drawn at the first click.
pub const MARKER_RADIUS_PX: f64 = 4.0;

// ---------------------------------------------------------------------------
// Pixel space
// ---------------------------------------------------------------------------

/// A point in display-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint of the segment `self -> other`.
    pub fn midpoint(&self, other: &PixelPoint) -> PixelPoint {
        PixelPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Rendered size of the frame surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A frame with a non-positive or non-finite side cannot anchor
    /// fractional coordinates.
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Whether `point` lies on the frame, edges included.
    pub fn contains(&self, point: &PixelPoint) -> bool {
        point.x.is_finite()
            && point.y.is_finite()
            && (0.0..=self.width).contains(&point.x)
            && (0.0..=self.height).contains(&point.y)
    }
}

// ---------------------------------------------------------------------------
// Fractional space
// ---------------------------------------------------------------------------

/// A resolution-independent point with both components in `[0, 1]`.
///
/// Serialized as a two-element array `[x, y]`, the shape the backend
/// stores. Deserialization rejects out-of-range components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct FractionalPoint {
    x: f64,
    y: f64,
}

impl FractionalPoint {
    /// Build a fractional point, failing if either component is outside
    /// `[0, 1]` or not finite.
    pub fn new(x: f64, y: f64) -> Result<Self, CoreError> {
        if !is_unit(x) || !is_unit(y) {
            return Err(CoreError::Normalization(format!(
                "fractional point ({x}, {y}) is outside [0, 1] x [0, 1]"
            )));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

fn is_unit(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

impl From<FractionalPoint> for [f64; 2] {
    fn from(p: FractionalPoint) -> Self {
        [p.x, p.y]
    }
}

impl TryFrom<[f64; 2]> for FractionalPoint {
    type Error = CoreError;

    fn try_from([x, y]: [f64; 2]) -> Result<Self, Self::Error> {
        FractionalPoint::new(x, y)
    }
}

/// Convert a pixel point to fractional space against `frame`.
///
/// Fails when the frame has no area or when the point lies outside it.
pub fn to_fractional(point: &PixelPoint, frame: &FrameSize) -> Result<FractionalPoint, CoreError> {
    if !frame.has_area() {
        return Err(CoreError::Normalization(format!(
            "frame {}x{} has no area",
            frame.width, frame.height
        )));
    }
    FractionalPoint::new(point.x / frame.width, point.y / frame.height)
}

/// Project a stored fractional point onto a frame of any size.
pub fn to_pixel(point: &FractionalPoint, frame: &FrameSize) -> PixelPoint {
    PixelPoint::new(point.x * frame.width, point.y * frame.height)
}

// ---------------------------------------------------------------------------
// Line placement
// ---------------------------------------------------------------------------

/// Screen placement of a drawn fence line and its endpoint labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePlacement {
    pub a: PixelPoint,
    pub b: PixelPoint,
    pub midpoint: PixelPoint,
    /// Unit normal pointing to the visual left of A -> B (y grows down).
    pub normal: (f64, f64),
    pub label_a: PixelPoint,
    pub label_b: PixelPoint,
}

/// Compute the midpoint, unit normal and label positions for segment
/// `a -> b`.
///
/// Label A sits at `midpoint + normal * offset`, label B on the opposite
/// side, so the assignment depends only on click order. A zero-length
/// segment has no normal and is rejected before any division.
pub fn place_line(a: PixelPoint, b: PixelPoint, offset: f64) -> Result<LinePlacement, CoreError> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = a.distance_to(&b);

    if length == 0.0 || !length.is_finite() {
        return Err(CoreError::Normalization(format!(
            "degenerate line: ({}, {}) and ({}, {}) coincide",
            a.x, a.y, b.x, b.y
        )));
    }

    let normal = (dy / length, -dx / length);
    let midpoint = a.midpoint(&b);

    Ok(LinePlacement {
        a,
        b,
        midpoint,
        normal,
        label_a: PixelPoint::new(midpoint.x + normal.0 * offset, midpoint.y + normal.1 * offset),
        label_b: PixelPoint::new(midpoint.x - normal.0 * offset, midpoint.y - normal.1 * offset),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // -- to_fractional -----------------------------------------------------

    #[test]
    fn fractional_of_interior_point() {
        let p = to_fractional(&PixelPoint::new(100.0, 100.0), &FrameSize::new(400.0, 200.0)).unwrap();
        assert!(approx(p.x(), 0.25));
        assert!(approx(p.y(), 0.5));
    }

    #[test]
    fn fractional_stays_in_unit_square_across_frame() {
        let frame = FrameSize::new(641.0, 359.0);
        for ix in 0..=16 {
            for iy in 0..=16 {
                let p = PixelPoint::new(frame.width * ix as f64 / 16.0, frame.height * iy as f64 / 16.0);
                let f = to_fractional(&p, &frame).unwrap();
                assert!((0.0..=1.0).contains(&f.x()), "x out of range for {p:?}");
                assert!((0.0..=1.0).contains(&f.y()), "y out of range for {p:?}");
            }
        }
    }

    #[test]
    fn fractional_of_far_corner_is_one() {
        let p = to_fractional(&PixelPoint::new(640.0, 360.0), &FrameSize::new(640.0, 360.0)).unwrap();
        assert_eq!((p.x(), p.y()), (1.0, 1.0));
    }

    #[test]
    fn zero_width_frame_rejected() {
        let err = to_fractional(&PixelPoint::new(0.0, 0.0), &FrameSize::new(0.0, 200.0)).unwrap_err();
        assert_matches!(err, CoreError::Normalization(_));
    }

    #[test]
    fn zero_height_frame_rejected() {
        let err = to_fractional(&PixelPoint::new(0.0, 0.0), &FrameSize::new(400.0, 0.0)).unwrap_err();
        assert_matches!(err, CoreError::Normalization(_));
    }

    #[test]
    fn point_outside_frame_rejected() {
        let err = to_fractional(&PixelPoint::new(401.0, 10.0), &FrameSize::new(400.0, 200.0)).unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn to_pixel_scales_to_target_frame() {
        let f = FractionalPoint::new(0.25, 0.5).unwrap();
        let p = to_pixel(&f, &FrameSize::new(1280.0, 720.0));
        assert_eq!(p, PixelPoint::new(320.0, 360.0));
    }

    // -- FractionalPoint serde ---------------------------------------------

    #[test]
    fn fractional_point_serializes_as_array() {
        let f = FractionalPoint::new(0.25, 0.5).unwrap();
        assert_eq!(serde_json::to_value(f).unwrap(), serde_json::json!([0.25, 0.5]));
    }

    #[test]
    fn fractional_point_rejects_out_of_range_json() {
        let result: Result<FractionalPoint, _> = serde_json::from_str("[1.5, 0.2]");
        assert!(result.is_err());
    }

    #[test]
    fn fractional_point_rejects_nan() {
        assert!(FractionalPoint::new(f64::NAN, 0.0).is_err());
    }

    // -- FrameSize ---------------------------------------------------------

    #[test]
    fn frame_contains_edges() {
        let frame = FrameSize::new(400.0, 200.0);
        assert!(frame.contains(&PixelPoint::new(0.0, 0.0)));
        assert!(frame.contains(&PixelPoint::new(400.0, 200.0)));
        assert!(!frame.contains(&PixelPoint::new(-0.5, 10.0)));
        assert!(!frame.contains(&PixelPoint::new(10.0, 200.5)));
    }

    #[test]
    fn negative_frame_has_no_area() {
        assert!(!FrameSize::new(-10.0, 20.0).has_area());
        assert!(!FrameSize::new(f64::INFINITY, 20.0).has_area());
    }

    // -- place_line --------------------------------------------------------

    #[test]
    fn horizontal_line_labels_above_and_below() {
        let placement = place_line(
            PixelPoint::new(100.0, 100.0),
            PixelPoint::new(300.0, 100.0),
            LABEL_OFFSET_PX,
        )
        .unwrap();
        assert_eq!(placement.midpoint, PixelPoint::new(200.0, 100.0));
        assert!(approx(placement.normal.0, 0.0));
        assert!(approx(placement.normal.1, -1.0));
        assert!(approx(placement.label_a.x, 200.0) && approx(placement.label_a.y, 75.0));
        assert!(approx(placement.label_b.x, 200.0) && approx(placement.label_b.y, 125.0));
    }

    #[test]
    fn reversed_click_order_swaps_label_sides() {
        let placement = place_line(
            PixelPoint::new(300.0, 100.0),
            PixelPoint::new(100.0, 100.0),
            LABEL_OFFSET_PX,
        )
        .unwrap();
        assert!(approx(placement.label_a.y, 125.0));
        assert!(approx(placement.label_b.y, 75.0));
    }

    #[test]
    fn normal_is_unit_length_for_diagonal() {
        let placement =
            place_line(PixelPoint::new(10.0, 20.0), PixelPoint::new(70.0, 100.0), 15.0).unwrap();
        let (nx, ny) = placement.normal;
        assert!(approx(nx.hypot(ny), 1.0));
        assert!(approx(placement.midpoint.distance_to(&placement.label_a), 15.0));
        assert!(approx(placement.midpoint.distance_to(&placement.label_b), 15.0));
    }

    #[test]
    fn degenerate_line_rejected_without_nan() {
        let p = PixelPoint::new(42.0, 42.0);
        let err = place_line(p, p, LABEL_OFFSET_PX).unwrap_err();
        assert_matches!(err, CoreError::Normalization(msg) if msg.contains("degenerate"));
    }
}
