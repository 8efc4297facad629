use grouping_store::StoreError;
use thiserror::Error;

/// Errors surfaced across the Group Engine and Manual Ops. Recoverable
/// per-face conditions (no bounding box, a recognition-engine failure, an
/// unreachable image) are absorbed internally and never become one of
/// these; only conditions the caller must see reach this type.
#[derive(Debug, Error)]
pub enum GroupingError {
    #[error("group {group_id} not found")]
    GroupNotFound { group_id: String },

    #[error("face {face_id} not found")]
    FaceNotFound { face_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{operation} is restricted to the configured test user")]
    Forbidden { operation: &'static str },

    #[error("at least one face is required for {operation}")]
    InvalidInput { operation: &'static str },
}
