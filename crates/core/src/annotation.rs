//! Interactive two-point fence annotation.
//!
//! [`AnnotationTool`] drives the click-to-draw interaction over a frozen
//! video frame:
//!
//! ```text
//! Idle --start_drawing--> AwaitingFirstPoint --click--> AwaitingSecondPoint
//!   ^                                                        |
//!   +----- finalize ok / cancel ---- Finalizing <---click----+
//! ```
//!
//! Visual feedback goes through the [`Overlay`] seam so the same machine
//! serves any UI shell; persistence goes through a [`FenceStore`] and a
//! [`ReloadSignal`].

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::fence::{FenceDescriptor, FenceMetadata, FenceType};
use crate::geometry::{
    place_line, to_fractional, FrameSize, LinePlacement, PixelPoint, LABEL_OFFSET_PX,
    MARKER_RADIUS_PX,
};
use crate::store::{unsupported_delete, FenceStore, ReloadSignal};
use crate::types::CameraId;

/// Points needed for a complete fence line.
pub const POINTS_PER_FENCE: usize = 2;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawState {
    Idle,
    AwaitingFirstPoint,
    AwaitingSecondPoint,
    /// Line drawn, waiting for the operator's form submission.
    Finalizing,
}

/// In-progress fence: up to two display-pixel points plus the frame they
/// are anchored to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FenceDraft {
    points: Vec<PixelPoint>,
    fence_type: Option<FenceType>,
    frame: Option<FrameSize>,
    drawing: bool,
}

impl FenceDraft {
    fn begin(fence_type: FenceType, frame: FrameSize) -> Self {
        Self {
            points: Vec::with_capacity(POINTS_PER_FENCE),
            fence_type: Some(fence_type),
            frame: Some(frame),
            drawing: true,
        }
    }

    /// Points in click order; the first is endpoint A.
    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    pub fn fence_type(&self) -> Option<FenceType> {
        self.fence_type
    }

    /// Frame size captured when the frame was frozen.
    pub fn frame(&self) -> Option<FrameSize> {
        self.frame
    }

    /// Whether clicks are still being collected.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.fence_type.is_none()
    }
}

// ---------------------------------------------------------------------------
// Overlay seam
// ---------------------------------------------------------------------------

/// Drawing instruction for the surface above the video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayCommand {
    /// Pause playback (or snapshot the stream) and paint the still frame.
    FreezeFrame { frame: FrameSize },
    ResumePlayback,
    Clear,
    Marker { at: PixelPoint, radius: f64 },
    Line {
        from: PixelPoint,
        to: PixelPoint,
        color: &'static str,
    },
    Label { text: &'static str, at: PixelPoint },
    /// Show the name/direction/time form for this fence type.
    OpenForm { fence_type: FenceType },
}

/// Rendering surface driven by the tool.
pub trait Overlay {
    fn render(&mut self, command: OverlayCommand);
}

/// Overlay that keeps every command, for headless shells and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    pub commands: Vec<OverlayCommand>,
}

impl Overlay for RecordingOverlay {
    fn render(&mut self, command: OverlayCommand) {
        self.commands.push(command);
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The click landed outside the frozen frame.
    OutsideFrame,
    /// The second click hit the first point exactly.
    DegenerateLine,
}

/// Result of feeding one click to the tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// No drawing session is collecting points.
    Ignored,
    FirstPoint(PixelPoint),
    /// Line complete; the tool is now [`DrawState::Finalizing`].
    Completed(LinePlacement),
    /// Click refused, state unchanged.
    Rejected(RejectReason),
}

/// What a successful [`AnnotationTool::finalize`] hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub fence_id: Option<i64>,
    pub descriptor: FenceDescriptor,
    /// False when the fence was stored but the reload signal failed.
    pub reloaded: bool,
}

// ---------------------------------------------------------------------------
// AnnotationTool
// ---------------------------------------------------------------------------

/// Fence annotation state machine for one camera view.
pub struct AnnotationTool<O: Overlay> {
    camera_id: CameraId,
    overlay: O,
    store: Arc<dyn FenceStore>,
    reload: Arc<dyn ReloadSignal>,
    state: DrawState,
    draft: FenceDraft,
    placement: Option<LinePlacement>,
    session: Option<Uuid>,
}

impl<O: Overlay> AnnotationTool<O> {
    pub fn new(
        camera_id: impl Into<CameraId>,
        overlay: O,
        store: Arc<dyn FenceStore>,
        reload: Arc<dyn ReloadSignal>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            overlay,
            store,
            reload,
            state: DrawState::Idle,
            draft: FenceDraft::default(),
            placement: None,
            session: None,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn draft(&self) -> &FenceDraft {
        &self.draft
    }

    /// Placement of the completed line while finalizing.
    pub fn placement(&self) -> Option<&LinePlacement> {
        self.placement.as_ref()
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Begin a drawing session for `fence_type` over a frame rendered at
    /// `frame`.
    ///
    /// Any session already in progress is discarded first, so at most one
    /// draft exists per tool.
    pub fn start_drawing(&mut self, fence_type: FenceType, frame: FrameSize) -> Result<(), CoreError> {
        if !frame.has_area() {
            return Err(CoreError::Normalization(format!(
                "cannot draw on a {}x{} frame",
                frame.width, frame.height
            )));
        }

        if self.state != DrawState::Idle {
            tracing::info!(
                camera_id = %self.camera_id,
                session = ?self.session,
                %fence_type,
                "Restarting drawing, previous draft discarded"
            );
            self.reset();
        }

        self.overlay.render(OverlayCommand::FreezeFrame { frame });
        self.overlay.render(OverlayCommand::Clear);

        let session = Uuid::new_v4();
        self.draft = FenceDraft::begin(fence_type, frame);
        self.session = Some(session);
        self.state = DrawState::AwaitingFirstPoint;

        tracing::info!(
            camera_id = %self.camera_id,
            %session,
            %fence_type,
            width = frame.width,
            height = frame.height,
            "Drawing started"
        );
        Ok(())
    }

    /// Feed a click in overlay-relative display pixels.
    pub fn handle_click(&mut self, point: PixelPoint) -> ClickOutcome {
        let frame = match (self.state, self.draft.frame) {
            (DrawState::AwaitingFirstPoint | DrawState::AwaitingSecondPoint, Some(frame)) => frame,
            _ => {
                tracing::debug!(state = ?self.state, "Click ignored");
                return ClickOutcome::Ignored;
            }
        };

        if !frame.contains(&point) {
            tracing::debug!(x = point.x, y = point.y, "Click outside frame rejected");
            return ClickOutcome::Rejected(RejectReason::OutsideFrame);
        }

        match self.state {
            DrawState::AwaitingFirstPoint => {
                self.draft.points.push(point);
                self.state = DrawState::AwaitingSecondPoint;
                self.overlay.render(OverlayCommand::Marker {
                    at: point,
                    radius: MARKER_RADIUS_PX,
                });
                ClickOutcome::FirstPoint(point)
            }
            DrawState::AwaitingSecondPoint => self.complete_line(point),
            DrawState::Idle | DrawState::Finalizing => ClickOutcome::Ignored,
        }
    }

    fn complete_line(&mut self, point: PixelPoint) -> ClickOutcome {
        let Some(&first) = self.draft.points.first() else {
            return ClickOutcome::Ignored;
        };

        let placement = match place_line(first, point, LABEL_OFFSET_PX) {
            Ok(placement) => placement,
            Err(e) => {
                tracing::debug!(error = %e, "Second click rejected");
                return ClickOutcome::Rejected(RejectReason::DegenerateLine);
            }
        };

        let fence_type = self.draft.fence_type.unwrap_or(FenceType::Gate);

        self.draft.points.push(point);
        self.draft.drawing = false;
        self.placement = Some(placement);
        self.state = DrawState::Finalizing;

        self.overlay.render(OverlayCommand::Line {
            from: placement.a,
            to: placement.b,
            color: fence_type.line_color(),
        });
        self.overlay.render(OverlayCommand::Label {
            text: "A",
            at: placement.label_a,
        });
        self.overlay.render(OverlayCommand::Label {
            text: "B",
            at: placement.label_b,
        });
        self.overlay.render(OverlayCommand::OpenForm { fence_type });

        tracing::debug!(session = ?self.session, "Fence line completed");
        ClickOutcome::Completed(placement)
    }

    /// Abandon the current session from any state. Calling it while idle
    /// is a no-op.
    pub fn cancel(&mut self) {
        if self.state == DrawState::Idle && self.draft.is_empty() {
            return;
        }
        tracing::info!(camera_id = %self.camera_id, session = ?self.session, "Drawing cancelled");
        self.reset();
    }

    /// Report that the rendering surface changed size.
    ///
    /// Pixel points are only meaningful against the frame they were
    /// clicked on, so a size change discards any in-progress draft.
    /// Returns whether a draft was discarded.
    pub fn resize(&mut self, frame: FrameSize) -> bool {
        match self.draft.frame {
            Some(current) if self.state != DrawState::Idle && current != frame => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    session = ?self.session,
                    old_width = current.width,
                    old_height = current.height,
                    new_width = frame.width,
                    new_height = frame.height,
                    "Surface resized mid-draft, draft discarded"
                );
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Submit the drawn line with the operator's form values.
    ///
    /// Validation and normalization happen before any network call. On a
    /// store failure the tool stays in [`DrawState::Finalizing`] with the
    /// draft intact, so the operator can retry without redrawing. After a
    /// successful add the backend is asked to reload; a failed reload is
    /// logged and reported in the receipt but does not undo the add.
    pub async fn finalize(&mut self, metadata: FenceMetadata) -> Result<SubmitReceipt, CoreError> {
        let descriptor = self.build_descriptor(&metadata)?;

        let fence_id = match self.store.add_fence(&descriptor).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    session = ?self.session,
                    error = %e,
                    "Fence submission failed, draft kept for retry"
                );
                return Err(e);
            }
        };

        let reloaded = match self.reload.request_reload(&self.camera_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(camera_id = %self.camera_id, error = %e, "Reload signal failed");
                false
            }
        };

        tracing::info!(
            camera_id = %self.camera_id,
            session = ?self.session,
            fence_type = %descriptor.fence_type,
            name = %descriptor.name,
            ?fence_id,
            reloaded,
            "Fence saved"
        );

        self.reset();
        Ok(SubmitReceipt {
            fence_id,
            descriptor,
            reloaded,
        })
    }

    /// Fences cannot be removed from the client. Always fails without
    /// contacting the store.
    pub async fn delete_fence(&self, fence_id: i64) -> Result<(), CoreError> {
        tracing::warn!(camera_id = %self.camera_id, fence_id, "Fence deletion refused");
        Err(unsupported_delete())
    }

    fn build_descriptor(&self, metadata: &FenceMetadata) -> Result<FenceDescriptor, CoreError> {
        let points = self.draft.points();
        if self.state != DrawState::Finalizing || points.len() != POINTS_PER_FENCE {
            return Err(CoreError::Validation(format!(
                "a fence needs {POINTS_PER_FENCE} points, {} drawn",
                points.len()
            )));
        }

        let (Some(fence_type), Some(frame)) = (self.draft.fence_type, self.draft.frame) else {
            return Err(CoreError::InvalidState(
                "finalizing draft has no fence type or frame".to_string(),
            ));
        };

        metadata.validate(fence_type)?;

        let point_a = to_fractional(&points[0], &frame)?;
        let point_b = to_fractional(&points[1], &frame)?;
        let window = metadata.time_window;

        Ok(FenceDescriptor {
            camera_id: self.camera_id.clone(),
            fence_type,
            name: metadata.name.trim().to_string(),
            direction: metadata.direction,
            point_a,
            point_b,
            time_start: window.map(|w| w.start),
            time_end: window.map(|w| w.end),
            created_at: chrono::Utc::now(),
        })
    }

    fn reset(&mut self) {
        self.overlay.render(OverlayCommand::Clear);
        self.overlay.render(OverlayCommand::ResumePlayback);
        self.draft = FenceDraft::default();
        self.placement = None;
        self.session = None;
        self.state = DrawState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
