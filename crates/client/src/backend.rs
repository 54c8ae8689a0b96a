use std::sync::Arc;

use gatewatch_core::error::CoreError;
use gatewatch_core::store::{
    CameraDirectory, EventHistory, FenceStore, ModeControl, NoReload, ReloadSignal,
};

use crate::config::{BackendConfig, BackendKind};
use crate::error::ClientError;
use crate::firestore::FirestoreBackend;
use crate::rest::RestBackend;

/// The collaborators one backend strategy provides, ready to inject into
/// an annotation tool or a CLI command.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub cameras: Arc<dyn CameraDirectory>,
    pub fences: Arc<dyn FenceStore>,
    pub reload: Arc<dyn ReloadSignal>,
    modes: Option<Arc<dyn ModeControl>>,
    events: Option<Arc<dyn EventHistory>>,
}

impl Backend {
    /// Build the configured strategy over one shared HTTP client.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = config.http_client()?;
        let backend = match config.kind {
            BackendKind::Rest => Self::rest(RestBackend::with_client(client, &config.api_base_url)),
            BackendKind::Firestore => {
                let project_id = config.firestore_project_id.clone().ok_or_else(|| {
                    ClientError::Config("FIRESTORE_PROJECT_ID is not set".into())
                })?;
                Self::firestore(FirestoreBackend::new(
                    client,
                    project_id,
                    config.firestore_api_key.clone(),
                ))
            }
        };
        tracing::info!(backend = %config.kind, "Backend configured");
        Ok(backend)
    }

    pub fn rest(backend: RestBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            kind: BackendKind::Rest,
            cameras: backend.clone(),
            fences: backend.clone(),
            reload: backend.clone(),
            modes: Some(backend.clone()),
            events: Some(backend),
        }
    }

    pub fn firestore(backend: FirestoreBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            kind: BackendKind::Firestore,
            cameras: backend.clone(),
            fences: backend,
            reload: Arc::new(NoReload),
            modes: None,
            events: None,
        }
    }

    pub fn modes(&self) -> Result<Arc<dyn ModeControl>, CoreError> {
        self.modes.clone().ok_or_else(|| {
            CoreError::Unsupported(format!("the {} backend has no detection modes", self.kind))
        })
    }

    pub fn events(&self) -> Result<Arc<dyn EventHistory>, CoreError> {
        self.events.clone().ok_or_else(|| {
            CoreError::Unsupported(format!("the {} backend has no alert history", self.kind))
        })
    }
}
