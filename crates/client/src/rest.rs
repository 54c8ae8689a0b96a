//! Client for the dashboard's REST backend.
//!
//! Wraps the `/api/...` endpoints (camera directory, fence tables, mode
//! toggles, schedules, gate reload, alert history) using [`reqwest`] and
//! implements every collaborator trait from `gatewatch_core::store`.

use async_trait::async_trait;
use chrono::NaiveTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use gatewatch_core::camera::{CameraRecord, CameraSummary, DetectionMode};
use gatewatch_core::error::CoreError;
use gatewatch_core::fence::{clock_opt, Direction, FenceDescriptor, FenceSummary, FenceType, TimeWindow};
use gatewatch_core::geometry::FractionalPoint;
use gatewatch_core::history::{AlertEvent, EventQuery};
use gatewatch_core::store::{CameraDirectory, EventHistory, FenceStore, ModeControl, ReloadSignal};

use crate::error::ClientError;
use crate::http::{ensure_success, segment_url};

/// HTTP client for one dashboard backend.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    api_url: String,
}

/// Body of `POST /api/fence/{type}/add`.
#[derive(Debug, Serialize)]
struct AddFenceRequest<'a> {
    camera_id: &'a str,
    name: &'a str,
    direction: Direction,
    #[serde(with = "clock_opt")]
    start_time: Option<NaiveTime>,
    #[serde(with = "clock_opt")]
    end_time: Option<NaiveTime>,
    point_a: FractionalPoint,
    point_b: FractionalPoint,
}

/// `{"status": "ok" | "error", ...}` acknowledgement returned by writes.
#[derive(Debug, Deserialize)]
struct Ack {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}

impl RestBackend {
    /// * `api_url` - Base HTTP URL, e.g. `http://host:5000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] (shared pool and timeout).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::parse_response(response).await
    }

    async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Ack, ClientError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::parse_ack(response).await
    }

    // ---- private helpers ----

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Decode a write acknowledgement. A `"status": "error"` payload is a
    /// rejection whether it arrives with a 2xx or a 5xx status.
    async fn parse_ack(response: reqwest::Response) -> Result<Ack, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        let ack = match serde_json::from_str::<Ack>(&body) {
            Ok(ack) => ack,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(ClientError::Decode(format!("acknowledgement: {e}"))),
        };

        if ack.status != "ok" {
            return Err(ClientError::Rejected(
                ack.message.unwrap_or_else(|| format!("status '{}'", ack.status)),
            ));
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(ack)
    }
}

#[async_trait]
impl CameraDirectory for RestBackend {
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>, CoreError> {
        Ok(self.get_json("/api/cameras", &[]).await?)
    }

    async fn get_camera(&self, camera_id: &str) -> Result<CameraRecord, CoreError> {
        let url = segment_url(&self.api_url, &["api", "camera", camera_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ClientError::from)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound {
                entity: "camera",
                id: camera_id.to_string(),
            });
        }
        Ok(Self::parse_response(response).await?)
    }
}

#[async_trait]
impl FenceStore for RestBackend {
    async fn list_fences(
        &self,
        camera_id: &str,
        fence_type: FenceType,
    ) -> Result<Vec<FenceSummary>, CoreError> {
        let path = format!("/api/fence/{}", fence_type.route_segment());
        Ok(self
            .get_json(&path, &[("camera_id", camera_id.to_string())])
            .await?)
    }

    async fn add_fence(&self, fence: &FenceDescriptor) -> Result<Option<i64>, CoreError> {
        let body = AddFenceRequest {
            camera_id: &fence.camera_id,
            name: &fence.name,
            direction: fence.direction,
            start_time: fence.time_start,
            end_time: fence.time_end,
            point_a: fence.point_a,
            point_b: fence.point_b,
        };
        let path = format!("/api/fence/{}/add", fence.fence_type.route_segment());
        let ack = self.post_ack(&path, &body).await?;

        tracing::info!(
            camera_id = %fence.camera_id,
            fence_type = %fence.fence_type,
            fence_id = ?ack.id,
            "Fence stored via REST"
        );
        Ok(ack.id)
    }
}

#[async_trait]
impl ModeControl for RestBackend {
    async fn set_mode(
        &self,
        camera_id: &str,
        mode: DetectionMode,
        enabled: bool,
    ) -> Result<(), CoreError> {
        let body = serde_json::json!({
            "camera_id": camera_id,
            "enabled": enabled,
        });
        self.post_ack(&format!("/api/mode/{mode}"), &body).await?;
        tracing::info!(camera_id, %mode, enabled, "Detection mode updated");
        Ok(())
    }

    async fn update_schedule(
        &self,
        camera_id: &str,
        mode: DetectionMode,
        window: TimeWindow,
    ) -> Result<(), CoreError> {
        let body = serde_json::json!({
            "camera_id": camera_id,
            "start_time": window.start.format("%H:%M").to_string(),
            "end_time": window.end.format("%H:%M").to_string(),
        });
        self.post_ack(&format!("/api/schedule/{mode}"), &body).await?;
        tracing::info!(camera_id, %mode, %window, "Detection schedule updated");
        Ok(())
    }
}

#[async_trait]
impl EventHistory for RestBackend {
    async fn query_events(&self, query: &EventQuery) -> Result<Vec<AlertEvent>, CoreError> {
        query.validate()?;
        Ok(self.get_json("/api/events", &query.to_query_pairs()).await?)
    }
}

#[async_trait]
impl ReloadSignal for RestBackend {
    async fn request_reload(&self, camera_id: &str) -> Result<(), CoreError> {
        let url = segment_url(&self.api_url, &["api", "reload_gates", camera_id])?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "camera_id": camera_id }))
            .send()
            .await
            .map_err(ClientError::from)?;
        ensure_success(response).await?;
        tracing::debug!(camera_id, "Gate reload requested");
        Ok(())
    }
}
