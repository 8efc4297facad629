use crate::{Store, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grouping_types::{Face, File, Group};
use sqlx::{PgPool, types::Json};
use std::collections::{BTreeMap, HashMap};

/// Firestore's `array-contains-any` caps its `IN`-list at 10 values; we
/// mirror that batching discipline here even though Postgres itself would
/// happily take a much larger array, so the query plan stays representative
/// of the system the store is standing in for.
const CONTAINS_ANY_BATCH_SIZE: usize = 10;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_group(&self, user_id: &str, group_id: &str) -> Result<Option<Group>, StoreError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT * FROM face_groups WHERE user_id = $1 AND group_id = $2",
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn put_group(&self, group: &Group) -> Result<Group, StoreError> {
        let row = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO face_groups (
                group_id, user_id, interview_id, face_ids, file_ids, face_count,
                leader_face_id, leader_file_id,
                leader_bbox_left, leader_bbox_top, leader_bbox_width, leader_bbox_height,
                status, group_name, person_name, merged_from, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, now())
            ON CONFLICT (group_id) DO UPDATE SET
                interview_id = EXCLUDED.interview_id,
                face_ids = EXCLUDED.face_ids,
                file_ids = EXCLUDED.file_ids,
                face_count = EXCLUDED.face_count,
                leader_face_id = EXCLUDED.leader_face_id,
                leader_file_id = EXCLUDED.leader_file_id,
                leader_bbox_left = EXCLUDED.leader_bbox_left,
                leader_bbox_top = EXCLUDED.leader_bbox_top,
                leader_bbox_width = EXCLUDED.leader_bbox_width,
                leader_bbox_height = EXCLUDED.leader_bbox_height,
                status = EXCLUDED.status,
                group_name = EXCLUDED.group_name,
                person_name = EXCLUDED.person_name,
                merged_from = EXCLUDED.merged_from,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&group.group_id)
        .bind(&group.user_id)
        .bind(&group.interview_id)
        .bind(&group.face_ids)
        .bind(&group.file_ids)
        .bind(group.face_count)
        .bind(&group.leader_face_id)
        .bind(&group.leader_file_id)
        .bind(group.leader_bbox_left)
        .bind(group.leader_bbox_top)
        .bind(group.leader_bbox_width)
        .bind(group.leader_bbox_height)
        .bind(group.status)
        .bind(&group.group_name)
        .bind(&group.person_name)
        .bind(&group.merged_from)
        .bind(group.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_group(&self, user_id: &str, group_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM face_groups WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_groups(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT * FROM face_groups WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn find_groups_containing_any(
        &self,
        user_id: &str,
        face_ids: &[String],
        interview_id: Option<&str>,
    ) -> Result<Vec<Group>, StoreError> {
        let mut by_id: BTreeMap<String, Group> = BTreeMap::new();

        for chunk in face_ids.chunks(CONTAINS_ANY_BATCH_SIZE) {
            let rows = sqlx::query_as::<_, Group>(
                r#"
                SELECT * FROM face_groups
                WHERE user_id = $1
                  AND face_ids && $2
                  AND ($3::text IS NULL OR interview_id IS NULL OR interview_id = $3)
                "#,
            )
            .bind(user_id)
            .bind(chunk)
            .bind(interview_id)
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                by_id.insert(row.group_id.clone(), row);
            }
        }

        Ok(by_id.into_values().collect())
    }

    async fn get_face(&self, user_id: &str, face_id: &str) -> Result<Option<Face>, StoreError> {
        let face = sqlx::query_as::<_, Face>(
            "SELECT * FROM faces WHERE user_id = $1 AND face_id = $2",
        )
        .bind(user_id)
        .bind(face_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(face)
    }

    async fn put_face(&self, face: &Face) -> Result<Face, StoreError> {
        let row = sqlx::query_as::<_, Face>(
            r#"
            INSERT INTO faces (
                face_id, user_id, group_id, file_id,
                bbox_left, bbox_top, bbox_width, bbox_height,
                confidence, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ON CONFLICT (face_id) DO UPDATE SET
                group_id = EXCLUDED.group_id,
                file_id = EXCLUDED.file_id,
                bbox_left = EXCLUDED.bbox_left,
                bbox_top = EXCLUDED.bbox_top,
                bbox_width = EXCLUDED.bbox_width,
                bbox_height = EXCLUDED.bbox_height,
                confidence = EXCLUDED.confidence,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&face.face_id)
        .bind(&face.user_id)
        .bind(&face.group_id)
        .bind(&face.file_id)
        .bind(face.bbox_left)
        .bind(face.bbox_top)
        .bind(face.bbox_width)
        .bind(face.bbox_height)
        .bind(face.confidence)
        .bind(face.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_face(&self, user_id: &str, face_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM faces WHERE user_id = $1 AND face_id = $2")
            .bind(user_id)
            .bind(face_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_faces_by_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<Vec<Face>, StoreError> {
        let faces = sqlx::query_as::<_, Face>(
            "SELECT * FROM faces WHERE user_id = $1 AND group_id = $2",
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(faces)
    }

    async fn get_file(&self, user_id: &str, file_id: &str) -> Result<Option<File>, StoreError> {
        let file = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE user_id = $1 AND file_id = $2",
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(file)
    }

    async fn update_file_mapping(
        &self,
        user_id: &str,
        file_id: &str,
        mapping: &HashMap<String, String>,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mapping_json = serde_json::to_value(mapping)?;
        sqlx::query(
            r#"
            UPDATE files
            SET face_group_mapping = COALESCE(face_group_mapping, '{}'::jsonb) || $3::jsonb,
                face_groups_processed_at = $4,
                updated_at = now()
            WHERE user_id = $1 AND file_id = $2
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .bind(Json(mapping_json))
        .bind(processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_all_groups(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let faces_result = sqlx::query("DELETE FROM faces WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let groups_result = sqlx::query("DELETE FROM face_groups WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(faces_result.rows_affected() + groups_result.rows_affected())
    }
}
