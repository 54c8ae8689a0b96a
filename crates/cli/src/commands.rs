//! Subcommand handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::json;

use gatewatch_client::Backend;
use gatewatch_core::annotation::{AnnotationTool, ClickOutcome, DrawState, SubmitReceipt};
use gatewatch_core::camera::{CameraRecord, CameraSummary, DetectionMode};
use gatewatch_core::fence::{FenceMetadata, FenceSummary, FenceType, TimeWindow};
use gatewatch_core::geometry::{to_pixel, FrameSize};
use gatewatch_core::history::{AlertEvent, EventQuery};
use gatewatch_core::store::{FenceStore, ReloadSignal};

use crate::args::{Cli, Command, DrawArgs, EventArgs};
use crate::overlay::LogOverlay;

const DETECTION_MODES: [DetectionMode; 2] = [DetectionMode::Falling, DetectionMode::Climbing];

/// Execute one parsed command against `backend`, printing the result.
pub async fn run(cli: Cli, backend: &Backend) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Cameras => {
            let cameras = backend.cameras.list_cameras().await?;
            emit(json, &cameras, |c| render_cameras(c))?;
        }
        Command::Camera { camera_id } => {
            let record = backend.cameras.get_camera(&camera_id).await?;
            emit(json, &record, render_camera)?;
        }
        Command::Fences {
            camera_id,
            fence_type,
        } => {
            let fences = backend.fences.list_fences(&camera_id, fence_type).await?;
            emit(json, &fences, |f| render_fences(fence_type, f))?;
        }
        Command::Draw(args) => {
            let receipt = draw(&args, backend.fences.clone(), backend.reload.clone()).await?;
            let summary = json!({
                "camera_id": receipt.descriptor.camera_id,
                "id": receipt.fence_id,
                "fence": receipt.descriptor,
                "reloaded": receipt.reloaded,
            });
            emit(json, &summary, |_| render_receipt(&receipt, &args.frame))?;
        }
        Command::Mode {
            camera_id,
            mode,
            state,
        } => {
            backend
                .modes()?
                .set_mode(&camera_id, mode, state.enabled())
                .await?;
            let verb = if state.enabled() { "enabled" } else { "disabled" };
            println!("{mode} detection {verb} on camera {camera_id}");
        }
        Command::Schedule {
            camera_id,
            mode,
            start,
            end,
        } => {
            let window = TimeWindow::parse(&start, &end)?
                .context("a schedule needs both a start and an end time")?;
            backend
                .modes()?
                .update_schedule(&camera_id, mode, window)
                .await?;
            println!("{mode} schedule on camera {camera_id} set to {window}");
        }
        Command::Events(args) => {
            let query = event_query(args);
            let events = backend.events()?.query_events(&query).await?;
            emit(json, &events, |e| render_events(e))?;
        }
        Command::DeleteFence {
            camera_id,
            fence_type,
            fence_id,
        } => {
            backend
                .fences
                .delete_fence(&camera_id, fence_type, fence_id)
                .await?;
        }
    }
    Ok(())
}

fn emit<T: serde::Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

pub fn event_query(args: EventArgs) -> EventQuery {
    EventQuery {
        start: args.start,
        end: args.end,
        event_type: args.event_type,
        level: args.level,
    }
}

// ---------------------------------------------------------------------------
// Draw
// ---------------------------------------------------------------------------

/// Run one headless annotation session: freeze a frame of the given size,
/// replay the clicks, then submit with the form values from `args`.
pub async fn draw(
    args: &DrawArgs,
    fences: Arc<dyn FenceStore>,
    reload: Arc<dyn ReloadSignal>,
) -> anyhow::Result<SubmitReceipt> {
    let mut metadata = FenceMetadata::new(args.name.clone(), args.direction);
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        if let Some(window) = TimeWindow::parse(start, end)? {
            metadata = metadata.with_time_window(window);
        }
    }

    let mut tool = AnnotationTool::new(args.camera_id.clone(), LogOverlay::default(), fences, reload);
    tool.start_drawing(args.fence_type, args.frame)?;

    for (i, click) in args.clicks.iter().enumerate() {
        match tool.handle_click(*click) {
            ClickOutcome::FirstPoint(_) => {}
            ClickOutcome::Completed(placement) => tracing::info!(
                label_a_x = placement.label_a.x,
                label_a_y = placement.label_a.y,
                label_b_x = placement.label_b.x,
                label_b_y = placement.label_b.y,
                "Fence line placed"
            ),
            ClickOutcome::Rejected(reason) => tracing::warn!(
                click = i + 1,
                x = click.x,
                y = click.y,
                ?reason,
                "Click rejected"
            ),
            ClickOutcome::Ignored => tracing::warn!(click = i + 1, "Extra click ignored"),
        }
    }

    if tool.state() != DrawState::Finalizing {
        let placed = tool.draft().points().len();
        tool.cancel();
        bail!("a fence needs two distinct clicks inside the frame, {placed} accepted");
    }

    Ok(tool.finalize(metadata).await?)
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

pub fn render_cameras(cameras: &[CameraSummary]) -> String {
    if cameras.is_empty() {
        return "No cameras.\n".to_string();
    }
    let mut out = String::new();
    for camera in cameras {
        let _ = writeln!(out, "{:<12} {:<24} {}", camera.camera_id, camera.camera_name, camera.camera_url);
    }
    out
}

pub fn render_camera(record: &CameraRecord) -> String {
    let mut out = format!(
        "{} ({})\n  url: {}\n",
        record.camera_name, record.camera_id, record.camera_url
    );
    for mode in DETECTION_MODES {
        let _ = writeln!(
            out,
            "  {:<9} {:<3} {}",
            format!("{mode}:"),
            if record.mode_enabled(mode) { "on" } else { "off" },
            record.schedule_for(mode)
        );
    }
    out
}

pub fn render_fences(fence_type: FenceType, fences: &[FenceSummary]) -> String {
    if fences.is_empty() {
        return format!("No {fence_type} fences.\n");
    }
    let mut out = String::new();
    for fence in fences {
        let id = fence.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        let direction = fence
            .direction()
            .map(|d| d.arrow().to_string())
            .unwrap_or_else(|| fence.direction.clone());
        let _ = writeln!(
            out,
            "{id:>4}  {:<20} {:<6} {}~{}",
            fence.name, direction, fence.start_time, fence.end_time
        );
    }
    out
}

pub fn render_events(events: &[AlertEvent]) -> String {
    if events.is_empty() {
        return "No events.\n".to_string();
    }
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "{:>6}  {}  {:<16} {:<16} {:<12} {}",
            event.event_id,
            event.display_timestamp(),
            event.camera_label(),
            event.gate_label(),
            event.event_type,
            event.alert_level
        );
    }
    out
}

/// Summarize a stored fence, with its endpoints projected back onto the
/// frame it was drawn on.
pub fn render_receipt(receipt: &SubmitReceipt, frame: &FrameSize) -> String {
    let fence = &receipt.descriptor;
    let a = to_pixel(&fence.point_a, frame);
    let b = to_pixel(&fence.point_b, frame);
    let id = receipt
        .fence_id
        .map(|id| format!(" as #{id}"))
        .unwrap_or_default();
    let mut out = format!(
        "Saved {} fence '{}'{id} on camera {} ({})\n  A = ({:.4}, {:.4})  B = ({:.4}, {:.4})\n",
        fence.fence_type,
        fence.name,
        fence.camera_id,
        fence.direction.arrow(),
        fence.point_a.x(),
        fence.point_a.y(),
        fence.point_b.x(),
        fence.point_b.y(),
    );
    let _ = writeln!(
        out,
        "  on {}x{}: A at ({:.0}, {:.0})  B at ({:.0}, {:.0})",
        frame.width, frame.height, a.x, a.y, b.x, b.y
    );
    if let Some(window) = fence.time_window() {
        let _ = writeln!(out, "  active {window}");
    }
    if !receipt.reloaded {
        out.push_str("  warning: backend did not confirm the reload\n");
    }
    out
}
