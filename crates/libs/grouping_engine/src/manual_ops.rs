use chrono::Utc;
use grouping_store::Store;
use grouping_types::{Face, Group, GroupStatus, ManualFaceInput};
use tracing::warn;

use crate::merge::merge_all;
use crate::GroupingError;

/// The operations the UI invokes directly, bypassing the match resolver,
/// deletion filter, and image probe entirely. Manual actions are an
/// explicit assertion from the user, not an inference from matches.
pub struct ManualOps<S: Store> {
    store: S,
}

impl<S: Store> ManualOps<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// `createGroupWithFaces(userId, faces, name?)`. Any face that already
    /// belongs to another group is moved: it is removed from its old group
    /// (which is left in place, even if now empty, so the UI can drag faces
    /// back into it) and added to the new one.
    pub async fn create_group_with_faces(
        &self,
        user_id: &str,
        faces: Vec<ManualFaceInput>,
        name: Option<String>,
    ) -> Result<Group, GroupingError> {
        if faces.is_empty() {
            return Err(GroupingError::InvalidInput { operation: "createGroupWithFaces" });
        }

        let now = Utc::now();
        let first = &faces[0];
        let mut group = Group {
            group_id: grouping_types::new_group_id(),
            user_id: user_id.to_string(),
            interview_id: None,
            face_ids: vec![],
            file_ids: vec![],
            face_count: 0,
            leader_face_id: Some(first.face_id.clone()),
            leader_file_id: Some(first.file_id.clone()),
            leader_bbox_left: Some(first.bounding_box.left),
            leader_bbox_top: Some(first.bounding_box.top),
            leader_bbox_width: Some(first.bounding_box.width),
            leader_bbox_height: Some(first.bounding_box.height),
            status: GroupStatus::Unreviewed,
            group_name: name,
            person_name: None,
            merged_from: vec![],
            created_at: now,
            updated_at: now,
        };

        for face_input in &faces {
            self.detach_from_current_group(user_id, &face_input.face_id).await?;

            if !group.face_ids.contains(&face_input.face_id) {
                group.face_ids.push(face_input.face_id.clone());
            }
            if !group.file_ids.contains(&face_input.file_id) {
                group.file_ids.push(face_input.file_id.clone());
            }
        }
        group.recompute_face_count();
        let group = self.store.put_group(&group).await?;

        for face_input in faces {
            let face_doc = Face::new(
                face_input.face_id,
                user_id,
                group.group_id.clone(),
                face_input.file_id,
                face_input.bounding_box,
                face_input.confidence,
                now,
            );
            self.store.put_face(&face_doc).await?;
        }

        Ok(group)
    }

    /// `addFaceToGroup(userId, groupId, faceId, fileId?)`. Idempotent: if
    /// the face already belongs to `groupId`, this is a no-op.
    pub async fn add_face_to_group(
        &self,
        user_id: &str,
        group_id: &str,
        face: ManualFaceInput,
    ) -> Result<Group, GroupingError> {
        let mut group = self
            .store
            .get_group(user_id, group_id)
            .await?
            .ok_or_else(|| GroupingError::GroupNotFound { group_id: group_id.to_string() })?;

        if group.face_ids.contains(&face.face_id) {
            return Ok(group);
        }

        self.detach_from_current_group(user_id, &face.face_id).await?;

        let now = Utc::now();
        group.face_ids.push(face.face_id.clone());
        if !group.file_ids.contains(&face.file_id) {
            group.file_ids.push(face.file_id.clone());
        }
        group.recompute_face_count();
        group.updated_at = now;
        let group = self.store.put_group(&group).await?;

        let face_doc = Face::new(
            face.face_id,
            user_id,
            group.group_id.clone(),
            face.file_id,
            face.bounding_box,
            face.confidence,
            now,
        );
        self.store.put_face(&face_doc).await?;

        Ok(group)
    }

    /// `removeFaceFromGroup(userId, groupId, faceId)`. The group is kept
    /// even if it becomes empty.
    pub async fn remove_face_from_group(
        &self,
        user_id: &str,
        group_id: &str,
        face_id: &str,
    ) -> Result<Group, GroupingError> {
        let mut group = self
            .store
            .get_group(user_id, group_id)
            .await?
            .ok_or_else(|| GroupingError::GroupNotFound { group_id: group_id.to_string() })?;

        group.face_ids.retain(|id| id != face_id);
        group.recompute_face_count();

        if group.leader_face_id.as_deref() == Some(face_id) {
            self.reassign_leader(&mut group, user_id).await?;
        }
        group.updated_at = Utc::now();

        let group = self.store.put_group(&group).await?;
        self.store.delete_face(user_id, face_id).await?;

        Ok(group)
    }

    /// `deleteGroup(userId, groupId)`. Member face docs are deleted
    /// alongside by default; pass `keep_faces = true` to re-home them
    /// instead (the caller is then responsible for reassigning them).
    pub async fn delete_group(
        &self,
        user_id: &str,
        group_id: &str,
        keep_faces: bool,
    ) -> Result<(), GroupingError> {
        if !keep_faces {
            let faces = self.store.list_faces_by_group(user_id, group_id).await?;
            for face in faces {
                self.store.delete_face(user_id, &face.face_id).await?;
            }
        }
        self.store.delete_group(user_id, group_id).await?;
        Ok(())
    }

    /// `mergeGroups(userId, [groupId])`. The first id is preferred as
    /// primary by [`crate::merge::pick_primary`]'s ordering only when it
    /// also satisfies the tie-break; ties aside, the caller's first id is
    /// folded in left to right pairwise via the shared merge primitive.
    pub async fn merge_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> Result<Group, GroupingError> {
        if group_ids.is_empty() {
            return Err(GroupingError::InvalidInput { operation: "mergeGroups" });
        }

        let mut groups = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            let group = self
                .store
                .get_group(user_id, group_id)
                .await?
                .ok_or_else(|| GroupingError::GroupNotFound { group_id: group_id.clone() })?;
            groups.push(group);
        }

        merge_all(&self.store, user_id, groups).await
    }

    /// `renameGroup(userId, groupId, personName)`. Pushes the group to
    /// `named`; does not touch membership.
    pub async fn rename_group(
        &self,
        user_id: &str,
        group_id: &str,
        person_name: impl Into<String>,
    ) -> Result<Group, GroupingError> {
        let mut group = self
            .store
            .get_group(user_id, group_id)
            .await?
            .ok_or_else(|| GroupingError::GroupNotFound { group_id: group_id.to_string() })?;

        group.person_name = Some(person_name.into());
        group.status = GroupStatus::Named;
        group.updated_at = Utc::now();

        self.store.put_group(&group).await
            .map_err(GroupingError::from)
    }

    /// `clearAllGroups(userId)`. The caller is expected to have already
    /// verified `userId` is the configured test user; this method performs
    /// no such check itself (symmetrical with the `Store` trait).
    pub async fn clear_all_groups(&self, user_id: &str) -> Result<u64, GroupingError> {
        Ok(self.store.clear_all_groups(user_id).await?)
    }

    async fn detach_from_current_group(
        &self,
        user_id: &str,
        face_id: &str,
    ) -> Result<(), GroupingError> {
        let Some(existing_face) = self.store.get_face(user_id, face_id).await? else {
            return Ok(());
        };

        let Some(mut old_group) = self.store.get_group(user_id, &existing_face.group_id).await?
        else {
            return Ok(());
        };

        old_group.face_ids.retain(|id| id != face_id);
        old_group.recompute_face_count();
        if old_group.leader_face_id.as_deref() == Some(face_id) {
            self.reassign_leader(&mut old_group, user_id).await?;
        }
        old_group.updated_at = Utc::now();
        self.store.put_group(&old_group).await?;

        Ok(())
    }

    /// Picks any remaining member as the new leader (conventionally the
    /// first), refreshing `leaderFaceData` from that member's face doc. If
    /// the group is now empty, the leader is cleared.
    async fn reassign_leader(&self, group: &mut Group, user_id: &str) -> Result<(), GroupingError> {
        let Some(next_leader_id) = group.face_ids.first().cloned() else {
            group.clear_leader();
            return Ok(());
        };

        match self.store.get_face(user_id, &next_leader_id).await? {
            Some(face) => {
                group.set_leader(face.face_id, face.file_id, face.bounding_box());
            }
            None => {
                warn!(face_id = %next_leader_id, "leader candidate has no face doc; clearing leader");
                group.clear_leader();
            }
        }
        Ok(())
    }
}
