use chrono::Utc;
use grouping_store::Store;
use grouping_types::{Face, FaceInput, Group, GroupStatus};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::deletion_filter::filter_tombstoned;
use crate::image_probe::ImageProbe;
use crate::match_resolver::MatchResolver;
use crate::merge::merge_all;
use crate::GroupingError;

/// The result of a single `processBatch` call.
#[derive(Debug, Clone)]
pub struct ProcessBatchResult {
    pub processed_count: usize,
    pub groups: Vec<Group>,
}

/// The transitive-closure maintainer. Generic over the store so the same
/// algorithm runs against Postgres in production and an in-memory double in
/// tests.
pub struct GroupEngine<S: Store, M: MatchResolver, P: ImageProbe> {
    store: S,
    match_resolver: M,
    image_probe: P,
    bounding_box_tolerance: f32,
}

impl<S: Store, M: MatchResolver, P: ImageProbe> GroupEngine<S, M, P> {
    pub fn new(store: S, match_resolver: M, image_probe: P, bounding_box_tolerance: f32) -> Self {
        Self {
            store,
            match_resolver,
            image_probe,
            bounding_box_tolerance,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// `processBatch(userId, fileId, faces, interviewId?)`.
    pub async fn process_batch(
        &self,
        user_id: &str,
        file_id: &str,
        faces: Vec<FaceInput>,
        interview_id: Option<&str>,
    ) -> Result<ProcessBatchResult, GroupingError> {
        // 1. Source validation.
        let Some(file) = self.store.get_file(user_id, file_id).await? else {
            return Ok(ProcessBatchResult { processed_count: 0, groups: vec![] });
        };
        let Some(url) = file.url.as_deref() else {
            return Ok(ProcessBatchResult { processed_count: 0, groups: vec![] });
        };
        if !self.image_probe.is_reachable(url).await {
            return Ok(ProcessBatchResult { processed_count: 0, groups: vec![] });
        }

        // 2. Tombstone filter.
        let faces = filter_tombstoned(faces, &file.deleted_faces.0, self.bounding_box_tolerance);
        if faces.is_empty() {
            return Ok(ProcessBatchResult { processed_count: 0, groups: vec![] });
        }

        // 3. Per-face processing, in input order.
        let mut touched_groups: HashMap<String, Group> = HashMap::new();
        let mut file_mapping: HashMap<String, String> = HashMap::new();
        let mut processed_count = 0usize;

        for face_input in faces {
            let Some(bbox) = face_input.bounding_box.as_ref().and_then(|raw| raw.validate())
            else {
                warn!(face_id = %face_input.face_id, "skipping face with missing or incomplete bounding box");
                continue;
            };

            let already_processed = match self.store.get_face(user_id, &face_input.face_id).await? {
                Some(existing) => self.store.get_group(user_id, &existing.group_id).await?,
                None => None,
            };

            let now = Utc::now();
            let group = if let Some(group) = already_processed {
                // Reprocessing the same (fileId, face) must be a no-op: the face doc
                // already points at a live group, so re-deriving membership from the
                // match resolver would allocate a fresh group every time a face with
                // no matches (a new person, or one the resolver finds nothing for) is
                // resubmitted.
                group
            } else {
                let matches = self.match_resolver.resolve(user_id, &face_input).await;

                let candidate_groups = if matches.is_empty() {
                    Vec::new()
                } else {
                    self.store
                        .find_groups_containing_any(user_id, &matches, interview_id)
                        .await?
                };

                match candidate_groups.len() {
                    0 => {
                        let mut group = Group {
                            group_id: grouping_types::new_group_id(),
                            user_id: user_id.to_string(),
                            interview_id: interview_id.map(str::to_string),
                            face_ids: vec![face_input.face_id.clone()],
                            file_ids: vec![file_id.to_string()],
                            face_count: 1,
                            leader_face_id: Some(face_input.face_id.clone()),
                            leader_file_id: Some(file_id.to_string()),
                            leader_bbox_left: Some(bbox.left),
                            leader_bbox_top: Some(bbox.top),
                            leader_bbox_width: Some(bbox.width),
                            leader_bbox_height: Some(bbox.height),
                            status: GroupStatus::Unreviewed,
                            group_name: None,
                            person_name: None,
                            merged_from: vec![],
                            created_at: now,
                            updated_at: now,
                        };
                        group.recompute_face_count();
                        self.store.put_group(&group).await?
                    }
                    1 => {
                        let mut group = candidate_groups.into_iter().next().unwrap();
                        if !group.face_ids.contains(&face_input.face_id) {
                            group.face_ids.push(face_input.face_id.clone());
                            if !group.file_ids.contains(&file_id.to_string()) {
                                group.file_ids.push(file_id.to_string());
                            }
                            group.recompute_face_count();
                            group.updated_at = now;
                            self.store.put_group(&group).await?
                        } else {
                            group
                        }
                    }
                    _ => {
                        let mut merged = merge_all(&self.store, user_id, candidate_groups).await?;
                        if !merged.face_ids.contains(&face_input.face_id) {
                            merged.face_ids.push(face_input.face_id.clone());
                            if !merged.file_ids.contains(&file_id.to_string()) {
                                merged.file_ids.push(file_id.to_string());
                            }
                            merged.recompute_face_count();
                            merged.updated_at = now;
                            self.store.put_group(&merged).await?
                        } else {
                            merged
                        }
                    }
                }
            };

            let face_doc = Face::new(
                face_input.face_id.clone(),
                user_id,
                group.group_id.clone(),
                file_id,
                bbox,
                face_input.confidence,
                now,
            );
            self.store.put_face(&face_doc).await?;

            file_mapping.insert(face_input.face_id.clone(), group.group_id.clone());
            touched_groups.insert(group.group_id.clone(), group);
            processed_count += 1;
        }

        // 4. File mapping.
        if !file_mapping.is_empty() {
            self.store
                .update_file_mapping(user_id, file_id, &file_mapping, Utc::now())
                .await?;
        }

        info!(user_id, file_id, processed_count, "processed face batch");

        Ok(ProcessBatchResult {
            processed_count,
            groups: touched_groups.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeImageProbe, StaticMatchResolver};
    use grouping_store::InMemoryStore;
    use grouping_types::{BoundingBox, DeletedFace, ExtractedFace, RawBoundingBox};
    use std::collections::HashMap as Map;

    fn raw_box(left: f32, top: f32, width: f32, height: f32) -> RawBoundingBox {
        RawBoundingBox {
            left: Some(left),
            top: Some(top),
            width: Some(width),
            height: Some(height),
        }
    }

    fn face(face_id: &str, bbox: RawBoundingBox, matched: Option<Vec<&str>>) -> FaceInput {
        FaceInput {
            face_id: face_id.to_string(),
            bounding_box: Some(bbox),
            confidence: Some(0.99),
            matched_face_ids: matched.map(|ids| ids.into_iter().map(str::to_string).collect()),
            group_id: None,
        }
    }

    fn seed_file(store: &InMemoryStore, user_id: &str, file_id: &str, url: &str, deleted: Vec<DeletedFace>) {
        store.seed_file(grouping_types::File {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            url: Some(url.to_string()),
            extracted_faces: sqlx::types::Json(Vec::<ExtractedFace>::new()),
            deleted_faces: sqlx::types::Json(deleted),
            face_group_mapping: sqlx::types::Json(Map::new()),
            face_groups_processed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    fn engine(
        store: InMemoryStore,
        resolver: StaticMatchResolver,
    ) -> GroupEngine<InMemoryStore, StaticMatchResolver, FakeImageProbe> {
        GroupEngine::new(store, resolver, FakeImageProbe::new(), 0.05)
    }

    #[tokio::test]
    async fn s1_chain_merge() {
        let store = InMemoryStore::new();
        seed_file(&store, "u1", "fileA", "https://img/a", vec![]);
        seed_file(&store, "u1", "fileB", "https://img/b", vec![]);
        seed_file(&store, "u1", "fileC", "https://img/c", vec![]);
        let engine = engine(store, StaticMatchResolver::new());

        engine
            .process_batch("u1", "fileA", vec![face("A", raw_box(0.1, 0.1, 0.1, 0.1), None)], None)
            .await
            .unwrap();
        let r2 = engine
            .process_batch(
                "u1",
                "fileB",
                vec![face("B", raw_box(0.2, 0.2, 0.1, 0.1), Some(vec!["A"]))],
                None,
            )
            .await
            .unwrap();
        let r3 = engine
            .process_batch(
                "u1",
                "fileC",
                vec![face("C", raw_box(0.3, 0.3, 0.1, 0.1), Some(vec!["B"]))],
                None,
            )
            .await
            .unwrap();

        assert_eq!(r2.groups.len(), 1);
        let final_group = &r3.groups[0];
        assert_eq!(final_group.face_count, 3);
        let mut face_ids = final_group.face_ids.clone();
        face_ids.sort();
        assert_eq!(face_ids, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
        let mut file_ids = final_group.file_ids.clone();
        file_ids.sort();
        assert_eq!(
            file_ids,
            vec!["fileA".to_string(), "fileB".to_string(), "fileC".to_string()]
        );
    }

    #[tokio::test]
    async fn s2_bridge_merge() {
        let store = InMemoryStore::new();
        seed_file(&store, "u1", "f1", "https://img/1", vec![]);
        seed_file(&store, "u1", "f2", "https://img/2", vec![]);
        seed_file(&store, "u1", "f3", "https://img/3", vec![]);
        let engine = engine(store, StaticMatchResolver::new());

        engine
            .process_batch("u1", "f1", vec![face("A", raw_box(0.1, 0.1, 0.1, 0.1), None)], None)
            .await
            .unwrap();
        engine
            .process_batch(
                "u1",
                "f1",
                vec![face("B", raw_box(0.15, 0.15, 0.1, 0.1), Some(vec!["A"]))],
                None,
            )
            .await
            .unwrap();
        engine
            .process_batch("u1", "f2", vec![face("C", raw_box(0.5, 0.5, 0.1, 0.1), None)], None)
            .await
            .unwrap();
        engine
            .process_batch(
                "u1",
                "f2",
                vec![face("D", raw_box(0.55, 0.55, 0.1, 0.1), Some(vec!["C"]))],
                None,
            )
            .await
            .unwrap();

        let bridge = engine
            .process_batch(
                "u1",
                "f3",
                vec![face("E", raw_box(0.3, 0.3, 0.1, 0.1), Some(vec!["B", "C"]))],
                None,
            )
            .await
            .unwrap();

        assert_eq!(bridge.groups.len(), 1);
        let group = &bridge.groups[0];
        assert_eq!(group.face_count, 5);
        assert_eq!(group.merged_from.len(), 1);
    }

    #[tokio::test]
    async fn s4_unreachable_image_yields_no_groups() {
        let store = InMemoryStore::new();
        store.seed_file(grouping_types::File {
            file_id: "f1".to_string(),
            user_id: "u1".to_string(),
            url: Some("https://img/dead".to_string()),
            extracted_faces: sqlx::types::Json(Vec::new()),
            deleted_faces: sqlx::types::Json(Vec::new()),
            face_group_mapping: sqlx::types::Json(Map::new()),
            face_groups_processed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        let probe = FakeImageProbe::new();
        probe.mark_unreachable("https://img/dead");
        let engine = GroupEngine::new(store, StaticMatchResolver::new(), probe, 0.05);

        let result = engine
            .process_batch(
                "u1",
                "f1",
                vec![
                    face("A", raw_box(0.1, 0.1, 0.1, 0.1), None),
                    face("B", raw_box(0.2, 0.2, 0.1, 0.1), None),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.processed_count, 0);
        assert!(result.groups.is_empty());
        assert!(engine.store().get_face("u1", "A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn s5_interview_scoping_keeps_groups_separate() {
        let store = InMemoryStore::new();
        seed_file(&store, "u1", "fileA", "https://img/a", vec![]);
        seed_file(&store, "u1", "fileB", "https://img/b", vec![]);
        let engine = engine(store, StaticMatchResolver::new());

        engine
            .process_batch("u1", "fileA", vec![face("A", raw_box(0.1, 0.1, 0.1, 0.1), None)], Some("X"))
            .await
            .unwrap();
        let r2 = engine
            .process_batch(
                "u1",
                "fileB",
                vec![face("B", raw_box(0.2, 0.2, 0.1, 0.1), Some(vec!["A"]))],
                Some("Y"),
            )
            .await
            .unwrap();

        assert_eq!(r2.groups.len(), 1);
        assert_eq!(r2.groups[0].face_count, 1);
        assert_eq!(r2.groups[0].face_ids, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn s3_tombstoned_face_never_reappears() {
        let store = InMemoryStore::new();
        let tombstoned_box = BoundingBox { left: 0.1, top: 0.1, width: 0.1, height: 0.1 };
        seed_file(
            &store,
            "u1",
            "f1",
            "https://img/1",
            vec![DeletedFace { bounding_box: tombstoned_box }],
        );
        let engine = engine(store, StaticMatchResolver::new());

        let result = engine
            .process_batch(
                "u1",
                "f1",
                vec![
                    face("F1", raw_box(0.1, 0.1, 0.1, 0.1), None),
                    face("F2", raw_box(0.6, 0.6, 0.1, 0.1), None),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.processed_count, 1);
        assert!(engine.store().get_face("u1", "F1").await.unwrap().is_none());
        assert!(engine.store().get_face("u1", "F2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn idempotent_reprocessing_is_a_no_op() {
        let store = InMemoryStore::new();
        seed_file(&store, "u1", "f1", "https://img/1", vec![]);
        let engine = engine(store, StaticMatchResolver::new());
        let batch = vec![face("A", raw_box(0.1, 0.1, 0.1, 0.1), None)];

        let first = engine.process_batch("u1", "f1", batch.clone(), None).await.unwrap();
        let second = engine.process_batch("u1", "f1", batch, None).await.unwrap();

        assert_eq!(first.groups[0].group_id, second.groups[0].group_id);
        assert_eq!(second.groups[0].face_count, 1);
    }
}
