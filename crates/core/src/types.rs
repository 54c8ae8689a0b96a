/// Camera identifiers are opaque strings (`"3"` on the REST backend,
/// `"camera_1"` on Firestore).
pub type CameraId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
