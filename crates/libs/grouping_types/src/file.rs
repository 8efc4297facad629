use crate::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::HashMap;

/// A single tombstoned face: the bounding box of a face the user removed
/// from a file. Bounding boxes are stable across re-indexing even though the
/// upstream engine reissues face IDs, so tombstones are matched on geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedFace {
    pub bounding_box: BoundingBox,
}

/// One upstream-produced face entry, as extracted by the external
/// face-recognition engine. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFace {
    pub face_id: String,
    pub bounding_box: BoundingBox,
}

/// Corresponds to the `files` table. Owned by an external uploader; the core
/// only reads `url`/`extracted_faces`/`deleted_faces` and writes
/// `face_group_mapping`/`face_groups_processed_at`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub user_id: String,
    pub url: Option<String>,
    pub extracted_faces: Json<Vec<ExtractedFace>>,
    pub deleted_faces: Json<Vec<DeletedFace>>,
    pub face_group_mapping: Json<HashMap<String, String>>,
    pub face_groups_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
