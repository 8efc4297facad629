use crate::{Store, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grouping_types::{Face, File, Group};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An in-process stand-in for [`PostgresStore`](crate::PostgresStore), used
/// to exercise `GroupEngine`/`ManualOps` in property tests without a live
/// database. Keyed the same way the Postgres tables are (`user_id` +
/// primary id), so callers can't observe a difference in scoping semantics.
/// Cheaply `Clone`: clones share the same underlying maps, mirroring how
/// cloning a `PgPool` shares the same connection pool.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    groups: Arc<Mutex<HashMap<(String, String), Group>>>,
    faces: Arc<Mutex<HashMap<(String, String), Face>>>,
    files: Arc<Mutex<HashMap<(String, String), File>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file doc directly, bypassing the `Store` trait's
    /// merge-on-write `update_file_mapping`. Test-only convenience.
    pub fn seed_file(&self, file: File) {
        let mut files = self.files.lock().unwrap();
        files.insert((file.user_id.clone(), file.file_id.clone()), file);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_group(&self, user_id: &str, group_id: &str) -> Result<Option<Group>, StoreError> {
        let groups = self.groups.lock().unwrap();
        Ok(groups.get(&(user_id.to_string(), group_id.to_string())).cloned())
    }

    async fn put_group(&self, group: &Group) -> Result<Group, StoreError> {
        let mut stored = group.clone();
        let mut groups = self.groups.lock().unwrap();
        let key = (group.user_id.clone(), group.group_id.clone());
        if let Some(existing) = groups.get(&key) {
            stored.created_at = existing.created_at;
        }
        stored.updated_at = Utc::now();
        groups.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_group(&self, user_id: &str, group_id: &str) -> Result<(), StoreError> {
        let mut groups = self.groups.lock().unwrap();
        groups.remove(&(user_id.to_string(), group_id.to_string()));
        Ok(())
    }

    async fn list_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let groups = self.groups.lock().unwrap();
        let mut matches: Vec<Group> = groups
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(matches)
    }

    async fn find_groups_containing_any(
        &self,
        user_id: &str,
        face_ids: &[String],
        interview_id: Option<&str>,
    ) -> Result<Vec<Group>, StoreError> {
        let groups = self.groups.lock().unwrap();
        let matches = groups
            .values()
            .filter(|g| g.user_id == user_id)
            .filter(|g| g.face_ids.iter().any(|f| face_ids.contains(f)))
            .filter(|g| match (interview_id, &g.interview_id) {
                (Some(requested), Some(group_scope)) => requested == group_scope,
                _ => true,
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn get_face(&self, user_id: &str, face_id: &str) -> Result<Option<Face>, StoreError> {
        let faces = self.faces.lock().unwrap();
        Ok(faces.get(&(user_id.to_string(), face_id.to_string())).cloned())
    }

    async fn put_face(&self, face: &Face) -> Result<Face, StoreError> {
        let mut stored = face.clone();
        let mut faces = self.faces.lock().unwrap();
        let key = (face.user_id.clone(), face.face_id.clone());
        if let Some(existing) = faces.get(&key) {
            stored.created_at = existing.created_at;
        }
        stored.updated_at = Utc::now();
        faces.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_face(&self, user_id: &str, face_id: &str) -> Result<(), StoreError> {
        let mut faces = self.faces.lock().unwrap();
        faces.remove(&(user_id.to_string(), face_id.to_string()));
        Ok(())
    }

    async fn list_faces_by_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<Vec<Face>, StoreError> {
        let faces = self.faces.lock().unwrap();
        Ok(faces
            .values()
            .filter(|f| f.user_id == user_id && f.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn get_file(&self, user_id: &str, file_id: &str) -> Result<Option<File>, StoreError> {
        let files = self.files.lock().unwrap();
        Ok(files.get(&(user_id.to_string(), file_id.to_string())).cloned())
    }

    async fn update_file_mapping(
        &self,
        user_id: &str,
        file_id: &str,
        mapping: &HashMap<String, String>,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut files = self.files.lock().unwrap();
        let key = (user_id.to_string(), file_id.to_string());
        let file = files.entry(key).or_insert_with(|| File {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            url: None,
            extracted_faces: sqlx::types::Json(Vec::new()),
            deleted_faces: sqlx::types::Json(Vec::new()),
            face_group_mapping: sqlx::types::Json(HashMap::new()),
            face_groups_processed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        for (face_id, group_id) in mapping {
            file.face_group_mapping.0.insert(face_id.clone(), group_id.clone());
        }
        file.face_groups_processed_at = Some(processed_at);
        file.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_all_groups(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut groups = self.groups.lock().unwrap();
        let mut faces = self.faces.lock().unwrap();

        let before = groups.len() + faces.len();
        groups.retain(|(owner, _), _| owner != user_id);
        faces.retain(|(owner, _), _| owner != user_id);
        let after = groups.len() + faces.len();

        Ok((before - after) as u64)
    }
}
