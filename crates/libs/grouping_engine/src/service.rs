use grouping_store::Store;
use grouping_types::{FaceInput, Group, ManualFaceInput};

use crate::group_engine::{GroupEngine, ProcessBatchResult};
use crate::image_probe::ImageProbe;
use crate::manual_ops::ManualOps;
use crate::match_resolver::MatchResolver;
use crate::GroupingError;

/// The transport-agnostic surface described in the inbound-operations table:
/// every operation an HTTP layer (or anything else) would call into. Wraps
/// [`GroupEngine`] and [`ManualOps`], which share the same store instance.
pub struct GroupingService<S: Store, M: MatchResolver, P: ImageProbe> {
    engine: GroupEngine<S, M, P>,
    manual_ops: ManualOps<S>,
    test_user_id: String,
}

impl<S: Store + Clone, M: MatchResolver, P: ImageProbe> GroupingService<S, M, P> {
    pub fn new(
        store: S,
        match_resolver: M,
        image_probe: P,
        bounding_box_tolerance: f32,
        test_user_id: impl Into<String>,
    ) -> Self {
        Self {
            engine: GroupEngine::new(store.clone(), match_resolver, image_probe, bounding_box_tolerance),
            manual_ops: ManualOps::new(store),
            test_user_id: test_user_id.into(),
        }
    }

    pub async fn process_batch(
        &self,
        user_id: &str,
        file_id: &str,
        faces: Vec<FaceInput>,
        interview_id: Option<&str>,
    ) -> Result<ProcessBatchResult, GroupingError> {
        self.engine.process_batch(user_id, file_id, faces, interview_id).await
    }

    pub async fn list_groups(&self, user_id: &str) -> Result<Vec<Group>, GroupingError> {
        Ok(self.manual_ops.store().list_groups(user_id).await?)
    }

    pub async fn get_group(&self, user_id: &str, group_id: &str) -> Result<Group, GroupingError> {
        self.manual_ops
            .store()
            .get_group(user_id, group_id)
            .await?
            .ok_or_else(|| GroupingError::GroupNotFound { group_id: group_id.to_string() })
    }

    pub async fn create_group(
        &self,
        user_id: &str,
        faces: Vec<ManualFaceInput>,
        name: Option<String>,
    ) -> Result<Group, GroupingError> {
        self.manual_ops.create_group_with_faces(user_id, faces, name).await
    }

    pub async fn add_face_to_group(
        &self,
        user_id: &str,
        group_id: &str,
        face: ManualFaceInput,
    ) -> Result<Group, GroupingError> {
        self.manual_ops.add_face_to_group(user_id, group_id, face).await
    }

    pub async fn remove_face_from_group(
        &self,
        user_id: &str,
        group_id: &str,
        face_id: &str,
    ) -> Result<Group, GroupingError> {
        self.manual_ops.remove_face_from_group(user_id, group_id, face_id).await
    }

    pub async fn rename_group(
        &self,
        user_id: &str,
        group_id: &str,
        person_name: impl Into<String>,
    ) -> Result<Group, GroupingError> {
        self.manual_ops.rename_group(user_id, group_id, person_name).await
    }

    pub async fn merge_groups(
        &self,
        user_id: &str,
        group_ids: &[String],
    ) -> Result<Group, GroupingError> {
        self.manual_ops.merge_groups(user_id, group_ids).await
    }

    pub async fn delete_group(
        &self,
        user_id: &str,
        group_id: &str,
        keep_faces: bool,
    ) -> Result<(), GroupingError> {
        self.manual_ops.delete_group(user_id, group_id, keep_faces).await
    }

    /// `clearAllGroups(userId)`, restricted to the configured test user.
    pub async fn clear_all_groups(&self, user_id: &str) -> Result<u64, GroupingError> {
        if user_id != self.test_user_id {
            return Err(GroupingError::Forbidden { operation: "clearAllGroups" });
        }
        self.manual_ops.clear_all_groups(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeImageProbe, StaticMatchResolver};
    use grouping_store::InMemoryStore;
    use grouping_types::{BoundingBox, ManualFaceInput};

    fn service() -> GroupingService<InMemoryStore, StaticMatchResolver, FakeImageProbe> {
        GroupingService::new(
            InMemoryStore::new(),
            StaticMatchResolver::new(),
            FakeImageProbe::new(),
            0.05,
            "test_user",
        )
    }

    #[tokio::test]
    async fn clear_all_groups_rejects_non_test_users() {
        let svc = service();
        let err = svc.clear_all_groups("someone_else").await.unwrap_err();
        assert!(matches!(err, GroupingError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn clear_all_groups_permits_the_test_user() {
        let svc = service();
        svc.create_group(
            "test_user",
            vec![ManualFaceInput {
                face_id: "A".into(),
                file_id: "f1".into(),
                bounding_box: BoundingBox { left: 0.1, top: 0.1, width: 0.1, height: 0.1 },
                confidence: None,
            }],
            None,
        )
        .await
        .unwrap();

        let deleted = svc.clear_all_groups("test_user").await.unwrap();
        assert!(deleted > 0);
    }

    #[tokio::test]
    async fn get_group_surfaces_not_found() {
        let svc = service();
        let err = svc.get_group("u1", "grp_missing").await.unwrap_err();
        assert!(matches!(err, GroupingError::GroupNotFound { .. }));
    }
}
