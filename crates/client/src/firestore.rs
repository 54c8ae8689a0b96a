//! Fence store backed by Cloud Firestore.
//!
//! Talks to the Firestore v1 REST API. Cameras are documents of the
//! `cameras` collection holding `name`, `video_url` and a `fences` array;
//! new fences are appended with an `appendMissingElements` field
//! transform, the REST form of `arrayUnion`.
//!
//! Firestore has no live enforcement hook and no mode/schedule or history
//! tables, so this backend only implements [`CameraDirectory`] and
//! [`FenceStore`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use gatewatch_core::camera::{CameraRecord, CameraSummary};
use gatewatch_core::error::CoreError;
use gatewatch_core::fence::{format_clock, FenceDescriptor, FenceSummary, FenceType};
use gatewatch_core::store::{CameraDirectory, FenceStore};

use crate::error::ClientError;
use crate::http::{ensure_success, segment_url};

pub const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com/v1";

const CAMERAS_COLLECTION: &str = "cameras";
const PAGE_SIZE: u32 = 100;

/// Firestore REST client scoped to one project's default database.
#[derive(Debug, Clone)]
pub struct FirestoreBackend {
    client: reqwest::Client,
    api_url: String,
    project_id: String,
    api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Stored shapes
// ---------------------------------------------------------------------------

/// A `cameras` document. Missing or null fields decode as empty; the
/// `fences` array is only inspected when fences are listed.
#[derive(Debug, Deserialize)]
struct CameraDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    fences: Value,
}

impl CameraDoc {
    fn summary(self, camera_id: &str) -> CameraSummary {
        CameraSummary {
            camera_id: camera_id.to_string(),
            camera_name: self.name.unwrap_or_default(),
            camera_url: self.video_url.unwrap_or_default(),
        }
    }

    /// Elements of the `fences` array that decode as fences. Anything else
    /// is logged and skipped.
    fn stored_fences(&self, camera_id: &str) -> Vec<StoredFence> {
        let items: &[Value] = match &self.fences {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            other => {
                tracing::warn!(camera_id, value = %other, "Camera fences field is not an array, ignored");
                &[]
            }
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match StoredFence::deserialize(item) {
                Ok(fence) => Some(fence),
                Err(e) => {
                    tracing::warn!(camera_id, index, error = %e, "Skipping malformed stored fence");
                    None
                }
            })
            .collect()
    }
}

/// One element of a camera document's `fences` array.
#[derive(Debug, Serialize, Deserialize)]
struct StoredFence {
    name: String,
    direction: String,
    #[serde(rename = "type")]
    fence_type: String,
    #[serde(default)]
    time_start: String,
    #[serde(default)]
    time_end: String,
    #[serde(default)]
    points: Vec<StoredPoint>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
}

/// Firestore forbids arrays directly inside arrays, so points are maps.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPoint {
    x: f64,
    y: f64,
}

impl StoredFence {
    fn from_descriptor(fence: &FenceDescriptor) -> Self {
        let clock = |t: Option<chrono::NaiveTime>| t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default();
        Self {
            name: fence.name.clone(),
            direction: fence.direction.to_string(),
            fence_type: fence.fence_type.as_str().to_string(),
            time_start: clock(fence.time_start),
            time_end: clock(fence.time_end),
            points: [fence.point_a, fence.point_b]
                .iter()
                .map(|p| StoredPoint { x: p.x(), y: p.y() })
                .collect(),
            created_at: Some(fence.created_at.to_rfc3339()),
        }
    }

    fn matches(&self, fence_type: FenceType) -> bool {
        self.fence_type
            .parse::<FenceType>()
            .is_ok_and(|t| t == fence_type)
    }

    fn summary(&self) -> FenceSummary {
        let clock = |raw: &str| {
            gatewatch_core::fence::parse_clock(raw)
                .map(format_clock)
                .unwrap_or_else(|_| raw.to_string())
        };
        FenceSummary {
            id: None,
            name: self.name.clone(),
            direction: self.direction.clone(),
            start_time: clock(&self.time_start),
            end_time: clock(&self.time_end),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Document {
    /// Last path segment of the document name.
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let plain: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), decode_value(v)))
            .collect();
        serde_json::from_value(Value::Object(plain))
            .map_err(|e| ClientError::Decode(format!("document {}: {e}", self.name)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed value codec
// ---------------------------------------------------------------------------

/// Encode plain JSON as a Firestore typed `Value`.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": { "fields": encode_fields(map) }
        }),
    }
}

fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

/// Decode a Firestore typed `Value` into plain JSON. Timestamps and
/// references come back as strings; unknown kinds as `null`.
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" | "doubleValue" => {
            inner.clone()
        }
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

/// Firestore document ids are single path segments.
fn document_id(camera_id: &str) -> Result<&str, ClientError> {
    if camera_id.is_empty() || camera_id.contains('/') || matches!(camera_id, "." | "..") {
        return Err(ClientError::InvalidSegment(camera_id.to_string()));
    }
    Ok(camera_id)
}

// ---------------------------------------------------------------------------
// FirestoreBackend
// ---------------------------------------------------------------------------

impl FirestoreBackend {
    pub fn new(client: reqwest::Client, project_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_api_url(client, FIRESTORE_API_URL, project_id, api_key)
    }

    /// Point at a different API root (emulator or test stub).
    pub fn with_api_url(
        client: reqwest::Client,
        api_url: impl Into<String>,
        project_id: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key,
        }
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    /// Resource name of a camera document, as used inside commit writes.
    fn camera_document_path(&self, camera_id: &str) -> Result<String, ClientError> {
        let id = document_id(camera_id)?;
        Ok(format!("{}/documents/{CAMERAS_COLLECTION}/{id}", self.database_path()))
    }

    /// REST URL under this project's default database.
    fn database_url(&self, tail: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut segments = vec!["projects", self.project_id.as_str(), "databases", "(default)"];
        segments.extend_from_slice(tail);
        segment_url(&self.api_url, &segments)
    }

    fn key_query(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }

    async fn fetch_camera(&self, camera_id: &str) -> Result<(Document, CameraDoc), CoreError> {
        let id = document_id(camera_id)?;
        let url = self.database_url(&["documents", CAMERAS_COLLECTION, id])?;
        let response = self
            .client
            .get(url)
            .query(&self.key_query())
            .send()
            .await
            .map_err(ClientError::from)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound {
                entity: "camera",
                id: camera_id.to_string(),
            });
        }
        let document: Document = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(ClientError::from)?;
        let camera = document.decode::<CameraDoc>()?;
        Ok((document, camera))
    }
}

#[async_trait]
impl CameraDirectory for FirestoreBackend {
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>, CoreError> {
        let url = self.database_url(&["documents", CAMERAS_COLLECTION])?;
        let mut cameras = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = self.key_query();
            query.push(("pageSize", PAGE_SIZE.to_string()));
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(url.clone())
                .query(&query)
                .send()
                .await
                .map_err(ClientError::from)?;
            let page: ListDocumentsResponse = ensure_success(response)
                .await?
                .json()
                .await
                .map_err(ClientError::from)?;

            for document in &page.documents {
                let camera = document.decode::<CameraDoc>()?;
                cameras.push(camera.summary(document.id()));
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = cameras.len(), "Listed Firestore cameras");
        Ok(cameras)
    }

    async fn get_camera(&self, camera_id: &str) -> Result<CameraRecord, CoreError> {
        let (document, camera) = self.fetch_camera(camera_id).await?;
        let summary = camera.summary(document.id());
        Ok(CameraRecord {
            camera_id: summary.camera_id,
            camera_name: summary.camera_name,
            camera_url: summary.camera_url,
            falling_detection_mode: false,
            climbing_detection_mode: false,
            schedules: Default::default(),
        })
    }
}

#[async_trait]
impl FenceStore for FirestoreBackend {
    async fn list_fences(
        &self,
        camera_id: &str,
        fence_type: FenceType,
    ) -> Result<Vec<FenceSummary>, CoreError> {
        let (_, camera) = self.fetch_camera(camera_id).await?;
        Ok(camera
            .stored_fences(camera_id)
            .iter()
            .filter(|f| f.matches(fence_type))
            .map(StoredFence::summary)
            .collect())
    }

    async fn add_fence(&self, fence: &FenceDescriptor) -> Result<Option<i64>, CoreError> {
        let document = self.camera_document_path(&fence.camera_id)?;
        let stored = serde_json::to_value(StoredFence::from_descriptor(fence))
            .map_err(|e| ClientError::Decode(format!("fence encoding: {e}")))?;

        let body = json!({
            "writes": [{
                "transform": {
                    "document": document,
                    "fieldTransforms": [{
                        "fieldPath": "fences",
                        "appendMissingElements": { "values": [encode_value(&stored)] },
                    }],
                },
                "currentDocument": { "exists": true },
            }],
        });

        let url = self.database_url(&["documents:commit"])?;
        let response = self
            .client
            .post(url)
            .query(&self.key_query())
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::NotFound {
                entity: "camera",
                id: fence.camera_id.clone(),
            });
        }
        ensure_success(response).await?;

        tracing::info!(
            camera_id = %fence.camera_id,
            fence_type = %fence.fence_type,
            name = %fence.name,
            "Fence appended in Firestore"
        );
        Ok(None)
    }
}
