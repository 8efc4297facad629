use crate::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Corresponds to the `faces` table: one detected face, persisted once it
/// has been processed or manually added.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Face {
    pub face_id: String,
    pub user_id: String,
    pub group_id: String,
    pub file_id: String,
    pub bbox_left: f32,
    pub bbox_top: f32,
    pub bbox_width: f32,
    pub bbox_height: f32,
    pub confidence: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Face {
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            left: self.bbox_left,
            top: self.bbox_top,
            width: self.bbox_width,
            height: self.bbox_height,
        }
    }

    #[must_use]
    pub fn new(
        face_id: impl Into<String>,
        user_id: impl Into<String>,
        group_id: impl Into<String>,
        file_id: impl Into<String>,
        bbox: BoundingBox,
        confidence: Option<f32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            face_id: face_id.into(),
            user_id: user_id.into(),
            group_id: group_id.into(),
            file_id: file_id.into(),
            bbox_left: bbox.left,
            bbox_top: bbox.top,
            bbox_width: bbox.width,
            bbox_height: bbox.height,
            confidence,
            created_at: now,
            updated_at: now,
        }
    }
}
