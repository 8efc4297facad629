use crate::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group review state. Monotonic: `Unreviewed -> Reviewed -> Named`.
/// Renaming a group always pushes it to `Named`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Unreviewed,
    Reviewed,
    Named,
}

/// A persistent set of face IDs asserted to depict the same person.
///
/// `face_ids`/`file_ids`/`merged_from` are stored as Postgres `TEXT[]`
/// columns rather than nested documents, and `leader_*` fields are flattened
/// rather than a nested leader-data object, since the core is backed by
/// Postgres rather than a document store.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub user_id: String,
    pub interview_id: Option<String>,
    pub face_ids: Vec<String>,
    pub file_ids: Vec<String>,
    pub face_count: i32,
    pub leader_face_id: Option<String>,
    pub leader_file_id: Option<String>,
    pub leader_bbox_left: Option<f32>,
    pub leader_bbox_top: Option<f32>,
    pub leader_bbox_width: Option<f32>,
    pub leader_bbox_height: Option<f32>,
    pub status: GroupStatus,
    pub group_name: Option<String>,
    pub person_name: Option<String>,
    pub merged_from: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    #[must_use]
    pub fn leader_bounding_box(&self) -> Option<BoundingBox> {
        Some(BoundingBox {
            left: self.leader_bbox_left?,
            top: self.leader_bbox_top?,
            width: self.leader_bbox_width?,
            height: self.leader_bbox_height?,
        })
    }

    pub fn set_leader(&mut self, face_id: impl Into<String>, file_id: impl Into<String>, bbox: BoundingBox) {
        self.leader_face_id = Some(face_id.into());
        self.leader_file_id = Some(file_id.into());
        self.leader_bbox_left = Some(bbox.left);
        self.leader_bbox_top = Some(bbox.top);
        self.leader_bbox_width = Some(bbox.width);
        self.leader_bbox_height = Some(bbox.height);
    }

    pub fn clear_leader(&mut self) {
        self.leader_face_id = None;
        self.leader_file_id = None;
        self.leader_bbox_left = None;
        self.leader_bbox_top = None;
        self.leader_bbox_width = None;
        self.leader_bbox_height = None;
    }

    /// `faceCount == |faceIds|`, recomputed rather than trusted.
    pub fn recompute_face_count(&mut self) {
        self.face_count = i32::try_from(self.face_ids.len()).unwrap_or(i32::MAX);
    }
}
