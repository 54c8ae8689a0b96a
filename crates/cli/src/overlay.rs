use gatewatch_core::annotation::{Overlay, OverlayCommand};

/// Overlay for headless sessions: every drawing command becomes a log
/// event, and the commands are kept for the final report.
#[derive(Debug, Default)]
pub struct LogOverlay {
    rendered: Vec<OverlayCommand>,
}

impl LogOverlay {
    pub fn rendered(&self) -> &[OverlayCommand] {
        &self.rendered
    }
}

impl Overlay for LogOverlay {
    fn render(&mut self, command: OverlayCommand) {
        match &command {
            OverlayCommand::FreezeFrame { frame } => {
                tracing::debug!(width = frame.width, height = frame.height, "Frame frozen")
            }
            OverlayCommand::ResumePlayback => tracing::debug!("Playback resumed"),
            OverlayCommand::Clear => tracing::trace!("Overlay cleared"),
            OverlayCommand::Marker { at, radius } => {
                tracing::debug!(x = at.x, y = at.y, radius, "Marker")
            }
            OverlayCommand::Line { from, to, color } => tracing::debug!(
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                color,
                "Line"
            ),
            OverlayCommand::Label { text, at } => {
                tracing::debug!(text, x = at.x, y = at.y, "Label")
            }
            OverlayCommand::OpenForm { fence_type } => {
                tracing::debug!(%fence_type, "Form opened")
            }
        }
        self.rendered.push(command);
    }
}
