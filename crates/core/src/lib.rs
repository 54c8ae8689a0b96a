//! Domain logic for the gatewatch surveillance dashboard.
//!
//! Holds the fence annotation state machine, coordinate normalization,
//! camera and alert-history records, and the collaborator traits that the
//! backend clients in `gatewatch-client` implement. Nothing here performs
//! I/O directly.

pub mod annotation;
pub mod camera;
pub mod error;
pub mod fence;
pub mod geometry;
pub mod history;
pub mod store;
pub mod types;
