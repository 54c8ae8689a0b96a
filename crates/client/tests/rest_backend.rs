//! Integration tests for [`RestBackend`] against an in-process stub of the
//! dashboard API.
//!
//! Each test binds an axum router to `127.0.0.1:0`, points the client at
//! it, and inspects what the stub received.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use gatewatch_client::rest::RestBackend;
use gatewatch_client::Backend;
use gatewatch_core::annotation::{AnnotationTool, DrawState, RecordingOverlay};
use gatewatch_core::camera::DetectionMode;
use gatewatch_core::error::CoreError;
use gatewatch_core::fence::{Direction, FenceMetadata, FenceType, TimeWindow};
use gatewatch_core::geometry::{FrameSize, PixelPoint};
use gatewatch_core::history::EventQuery;
use gatewatch_core::store::{CameraDirectory, EventHistory, FenceStore, ModeControl, ReloadSignal};

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

/// Requests seen by the stub, as `(path, body-or-query)`.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(String, Value)>>>);

impl Recorder {
    fn push(&self, path: String, payload: Value) {
        self.0.lock().unwrap().push((path, payload));
    }

    fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

async fn list_cameras() -> Json<Value> {
    Json(json!([
        {"camera_id": 1, "camera_name": "Gate", "camera_url": "rtsp://10.0.0.1/live"},
        {"camera_id": 2, "camera_name": "Yard", "camera_url": "rtsp://10.0.0.2/live"},
    ]))
}

async fn get_camera(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id != "1" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Camera not found"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "camera_id": 1, "camera_name": "Gate", "camera_url": "rtsp://10.0.0.1/live",
            "falling_detection_mode": 1, "climbing_detection_mode": 0,
            "schedules": {"falling": {"start": "08:00", "end": "18:00"}}
        })),
    )
}

async fn list_fences(
    State(rec): State<Recorder>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push(format!("/api/fence/{kind}"), json!(params));
    Json(json!([
        {"id": 4, "name": "north", "direction": "AtoB", "start_time": "--:--", "end_time": "--:--"}
    ]))
}

async fn add_fence(
    State(rec): State<Recorder>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.push(format!("/api/fence/{kind}/add"), body.clone());
    if body["name"] == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "message": "Duplicate entry 'boom'"})),
        );
    }
    (StatusCode::OK, Json(json!({"status": "ok", "id": 12})))
}

async fn write_ok(State(rec): State<Recorder>, uri: Uri, Json(body): Json<Value>) -> Json<Value> {
    rec.push(uri.path().to_string(), body);
    Json(json!({"status": "ok", "message": "updated"}))
}

async fn events(
    State(rec): State<Recorder>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push("/api/events".into(), json!(params));
    Json(json!([
        {"event_id": 9, "camera_name": "Gate", "gate_name": null, "event_type": "intrusion",
         "alert_level": "high", "timestamp": "Tue, 14 Oct 2025 08:05:09 GMT"}
    ]))
}

async fn spawn_stub() -> (RestBackend, Recorder) {
    let rec = Recorder::default();
    let app = Router::new()
        .route("/api/cameras", get(list_cameras))
        .route("/api/camera/{id}", get(get_camera))
        .route("/api/fence/{kind}", get(list_fences))
        .route("/api/fence/{kind}/add", post(add_fence))
        .route("/api/mode/{mode}", post(write_ok))
        .route("/api/schedule/{mode}", post(write_ok))
        .route("/api/reload_gates/{camera_id}", post(write_ok))
        .route("/api/events", get(events))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (RestBackend::new(format!("http://{addr}")), rec)
}

// ---------------------------------------------------------------------------
// Test: camera directory
// ---------------------------------------------------------------------------

/// Integer camera ids from the SQL backend come back as strings.
#[tokio::test]
async fn lists_cameras() {
    let (backend, _) = spawn_stub().await;
    let cameras = backend.list_cameras().await.unwrap();
    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras[1].camera_id, "2");
    assert_eq!(cameras[1].camera_name, "Yard");
}

#[tokio::test]
async fn camera_record_decodes_flags() {
    let (backend, _) = spawn_stub().await;
    let record = backend.get_camera("1").await.unwrap();
    assert!(record.mode_enabled(DetectionMode::Falling));
    assert!(!record.mode_enabled(DetectionMode::Climbing));
}

/// A 404 maps to `NotFound` rather than a transport error.
#[tokio::test]
async fn unknown_camera_is_not_found() {
    let (backend, _) = spawn_stub().await;
    assert_matches!(
        backend.get_camera("99").await,
        Err(CoreError::NotFound { entity: "camera", id }) if id == "99"
    );
}

/// A slash in the id stays inside one path segment instead of walking to
/// another route.
#[tokio::test]
async fn camera_id_is_one_path_segment() {
    let (backend, rec) = spawn_stub().await;
    assert_matches!(
        backend.get_camera("../camera/1").await,
        Err(CoreError::NotFound { id, .. }) if id == "../camera/1"
    );

    backend.request_reload("7/../1").await.unwrap();
    let seen = rec.take();
    assert_eq!(seen[0].0, "/api/reload_gates/7%2F..%2F1");
    assert_eq!(seen[0].1, json!({"camera_id": "7/../1"}));

    assert_matches!(backend.request_reload("..").await, Err(CoreError::Validation(_)));
    assert!(rec.take().is_empty());
}

// ---------------------------------------------------------------------------
// Test: fences
// ---------------------------------------------------------------------------

/// Gate fences use the `inout` route segment and pass the camera id as a
/// query parameter.
#[tokio::test]
async fn lists_gate_fences_on_inout_route() {
    let (backend, rec) = spawn_stub().await;
    let fences = backend.list_fences("1", FenceType::Gate).await.unwrap();
    assert_eq!(fences[0].name, "north");
    assert_eq!(fences[0].direction(), Some(Direction::AtoB));

    let seen = rec.take();
    assert_eq!(seen[0].0, "/api/fence/inout");
    assert_eq!(seen[0].1, json!({"camera_id": "1"}));
}

/// A `"status": "error"` payload surfaces as a transport error carrying
/// the backend message.
#[tokio::test]
async fn rejected_add_is_transport_error() {
    let (backend, _) = spawn_stub().await;
    let mut tool = AnnotationTool::new(
        "1",
        RecordingOverlay::default(),
        Arc::new(backend.clone()),
        Arc::new(backend),
    );
    tool.start_drawing(FenceType::Intrusion, FrameSize::new(400.0, 200.0))
        .unwrap();
    tool.handle_click(PixelPoint::new(10.0, 10.0));
    tool.handle_click(PixelPoint::new(20.0, 20.0));

    let err = tool
        .finalize(FenceMetadata::new("boom", Direction::AtoB))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Transport(msg) if msg.contains("Duplicate entry"));
    assert_eq!(tool.state(), DrawState::Finalizing);
}

// ---------------------------------------------------------------------------
// Test: end-to-end through the REST backend
// ---------------------------------------------------------------------------

/// Finalizing a drawn gate posts exactly one add with the normalized
/// points, then one reload for the same camera.
#[tokio::test]
async fn drawn_gate_is_posted_then_reloaded() {
    let (backend, rec) = spawn_stub().await;
    let bundle = Backend::rest(backend);
    let mut tool = AnnotationTool::new(
        "1",
        RecordingOverlay::default(),
        bundle.fences.clone(),
        bundle.reload.clone(),
    );

    tool.start_drawing(FenceType::Gate, FrameSize::new(400.0, 200.0))
        .unwrap();
    tool.handle_click(PixelPoint::new(100.0, 100.0));
    tool.handle_click(PixelPoint::new(300.0, 100.0));

    let window: TimeWindow = TimeWindow::parse("22:00", "06:00").unwrap().unwrap();
    let receipt = tool
        .finalize(FenceMetadata::new("north", Direction::AtoB).with_time_window(window))
        .await
        .unwrap();
    assert_eq!(receipt.fence_id, Some(12));
    assert!(receipt.reloaded);
    assert_eq!(tool.state(), DrawState::Idle);

    let seen = rec.take();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "/api/fence/inout/add");
    assert_eq!(
        seen[0].1,
        json!({
            "camera_id": "1",
            "name": "north",
            "direction": "AtoB",
            "start_time": "22:00",
            "end_time": "06:00",
            "point_a": [0.25, 0.5],
            "point_b": [0.75, 0.5],
        })
    );
    assert_eq!(seen[1], ("/api/reload_gates/1".to_string(), json!({"camera_id": "1"})));
}

// ---------------------------------------------------------------------------
// Test: modes, schedules, history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mode_and_schedule_bodies() {
    let (backend, rec) = spawn_stub().await;
    backend.set_mode("1", DetectionMode::Climbing, true).await.unwrap();
    backend
        .update_schedule(
            "1",
            DetectionMode::Falling,
            TimeWindow::parse("08:00", "17:30").unwrap().unwrap(),
        )
        .await
        .unwrap();

    let seen = rec.take();
    assert_eq!(
        seen[0],
        ("/api/mode/climbing".to_string(), json!({"camera_id": "1", "enabled": true}))
    );
    assert_eq!(
        seen[1],
        (
            "/api/schedule/falling".to_string(),
            json!({"camera_id": "1", "start_time": "08:00", "end_time": "17:30"})
        )
    );
}

/// Date filters expand to whole days; missing names display as a dash.
#[tokio::test]
async fn event_query_parameters() {
    let (backend, rec) = spawn_stub().await;
    let query = EventQuery {
        start: chrono::NaiveDate::from_ymd_opt(2025, 10, 1),
        end: chrono::NaiveDate::from_ymd_opt(2025, 10, 14),
        event_type: Some("intrusion".into()),
        level: None,
    };
    let events = backend.query_events(&query).await.unwrap();
    assert_eq!(events[0].gate_label(), "—");
    assert_eq!(events[0].display_timestamp(), "2025-10-14 08:05:09");

    let seen = rec.take();
    assert_eq!(
        seen[0].1,
        json!({"start": "2025-10-01 00:00:00", "end": "2025-10-14 23:59:59", "type": "intrusion"})
    );
}

/// An inverted range fails validation before any request is made.
#[tokio::test]
async fn inverted_event_range_not_sent() {
    let (backend, rec) = spawn_stub().await;
    let query = EventQuery {
        start: chrono::NaiveDate::from_ymd_opt(2025, 10, 14),
        end: chrono::NaiveDate::from_ymd_opt(2025, 10, 1),
        ..Default::default()
    };
    assert_matches!(backend.query_events(&query).await, Err(CoreError::Validation(_)));
    assert!(rec.take().is_empty());
}
