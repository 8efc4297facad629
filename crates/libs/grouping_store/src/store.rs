use crate::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grouping_types::{Face, File, Group};
use std::collections::HashMap;

/// Abstracts the document store: group docs, face docs, file docs.
///
/// Each operation is individually atomic at the document level; the adapter
/// does **not** provide cross-document transactions. `GroupEngine`/
/// `ManualOps` compensate for that by always sequencing writes so that the
/// face doc (the "find" map, in union-find terms) is updated before the
/// group doc it now lives in, and before any now-stale group doc is deleted.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_group(&self, user_id: &str, group_id: &str) -> Result<Option<Group>, StoreError>;

    /// Upserts a group. Always refreshes `updated_at`.
    async fn put_group(&self, group: &Group) -> Result<Group, StoreError>;

    async fn delete_group(&self, user_id: &str, group_id: &str) -> Result<(), StoreError>;

    /// Ordered by `updated_at` descending.
    async fn list_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError>;

    /// Returns every group whose `face_ids` intersects `face_ids`. If
    /// `interview_id` is `Some`, groups whose `interview_id` is set and
    /// differs are excluded; groups with no `interview_id` always match
    /// (global groups participate in every scope). Input larger than the
    /// store's batching threshold is chunked transparently; the result is
    /// deduplicated by `group_id`.
    async fn find_groups_containing_any(
        &self,
        user_id: &str,
        face_ids: &[String],
        interview_id: Option<&str>,
    ) -> Result<Vec<Group>, StoreError>;

    async fn get_face(&self, user_id: &str, face_id: &str) -> Result<Option<Face>, StoreError>;

    /// Upserts a face. Always refreshes `updated_at`; preserves the original
    /// `created_at` on conflict.
    async fn put_face(&self, face: &Face) -> Result<Face, StoreError>;

    async fn delete_face(&self, user_id: &str, face_id: &str) -> Result<(), StoreError>;

    async fn list_faces_by_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<Vec<Face>, StoreError>;

    async fn get_file(&self, user_id: &str, file_id: &str) -> Result<Option<File>, StoreError>;

    /// Merges `mapping` into the file's `face_group_mapping` (existing keys
    /// not present in `mapping` are left untouched) and sets
    /// `face_groups_processed_at`.
    async fn update_file_mapping(
        &self,
        user_id: &str,
        file_id: &str,
        mapping: &HashMap<String, String>,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Deletes every group and face belonging to `user_id`. Restricted by
    /// callers to the configured test user (`Forbidden` otherwise); the
    /// store itself performs no such check.
    async fn clear_all_groups(&self, user_id: &str) -> Result<u64, StoreError>;
}
