//! Collaborator contracts consumed by the annotation tool and the CLI.
//!
//! Backends (REST, Firestore) implement these in `gatewatch-client`; the
//! core never talks to the network itself.

use async_trait::async_trait;

use crate::camera::{CameraRecord, CameraSummary, DetectionMode};
use crate::error::CoreError;
use crate::fence::{FenceDescriptor, FenceSummary, FenceType, TimeWindow};
use crate::history::{AlertEvent, EventQuery};

/// Lists cameras and fetches individual camera records.
#[async_trait]
pub trait CameraDirectory: Send + Sync {
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>, CoreError>;

    async fn get_camera(&self, camera_id: &str) -> Result<CameraRecord, CoreError>;
}

/// Persists and lists fences per camera and fence type.
///
/// Stores are append-only from the client's point of view: there is no
/// update, and removal means rewriting the whole collection out of band.
#[async_trait]
pub trait FenceStore: Send + Sync {
    async fn list_fences(
        &self,
        camera_id: &str,
        fence_type: FenceType,
    ) -> Result<Vec<FenceSummary>, CoreError>;

    /// Persist a new fence. Returns the backend-assigned id when the backend
    /// reports one.
    async fn add_fence(&self, fence: &FenceDescriptor) -> Result<Option<i64>, CoreError>;

    /// Always fails; stores cannot remove a single fence.
    async fn delete_fence(
        &self,
        camera_id: &str,
        fence_type: FenceType,
        fence_id: i64,
    ) -> Result<(), CoreError> {
        tracing::warn!(camera_id, %fence_type, fence_id, "Fence deletion requested");
        Err(unsupported_delete())
    }
}

/// The error every delete attempt surfaces.
pub fn unsupported_delete() -> CoreError {
    CoreError::Unsupported(
        "fences cannot be deleted individually; rewrite the camera's fence collection on the backend"
            .to_string(),
    )
}

/// Toggles and schedules per-camera detection modes.
#[async_trait]
pub trait ModeControl: Send + Sync {
    async fn set_mode(
        &self,
        camera_id: &str,
        mode: DetectionMode,
        enabled: bool,
    ) -> Result<(), CoreError>;

    async fn update_schedule(
        &self,
        camera_id: &str,
        mode: DetectionMode,
        window: TimeWindow,
    ) -> Result<(), CoreError>;
}

/// Queries past alerts.
#[async_trait]
pub trait EventHistory: Send + Sync {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<AlertEvent>, CoreError>;
}

/// Tells the backend to re-read fence geometry for live enforcement.
#[async_trait]
pub trait ReloadSignal: Send + Sync {
    async fn request_reload(&self, camera_id: &str) -> Result<(), CoreError>;
}

/// Reload signal for backends without live enforcement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReload;

#[async_trait]
impl ReloadSignal for NoReload {
    async fn request_reload(&self, camera_id: &str) -> Result<(), CoreError> {
        tracing::debug!(camera_id, "Backend has no live enforcement, skipping reload");
        Ok(())
    }
}
