use crate::{BoundingBox, RawBoundingBox};
use serde::{Deserialize, Serialize};

/// The face object carried by `processBatch`'s `faces[]` input. Unknown
/// fields are ignored by `serde`'s default behavior (no `deny_unknown_fields`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceInput {
    pub face_id: String,
    #[serde(default)]
    pub bounding_box: Option<RawBoundingBox>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub matched_face_ids: Option<Vec<String>>,
    /// Present in the wire schema but ignored by the core: group membership
    /// is always derived, never taken on faith from the caller.
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Input to the manual "add a face" family of operations
/// (`createGroupWithFaces`, `addFaceToGroup`). Unlike `FaceInput`, the file
/// it belongs to and its geometry are mandatory here: manual ops bypass the
/// match resolver, deletion filter, and image probe entirely, so there is
/// no batch-level `fileId` to fall back on and no upstream-extracted box to
/// default to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFaceInput {
    pub face_id: String,
    pub file_id: String,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub confidence: Option<f32>,
}
