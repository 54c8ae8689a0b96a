//! Backend strategies for the gatewatch dashboard.
//!
//! Provides a REST client for the dashboard API, a Firestore REST client
//! for deployments that keep cameras and fences in Cloud Firestore, and
//! environment-driven configuration that picks between them.

pub mod backend;
pub mod config;
pub mod error;
pub mod firestore;
mod http;
pub mod rest;

pub use backend::Backend;
pub use config::{BackendConfig, BackendKind};
pub use error::ClientError;
