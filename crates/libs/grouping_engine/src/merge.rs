use chrono::Utc;
use grouping_store::Store;
use grouping_types::Group;
use std::collections::BTreeSet;
use tracing::error;

use crate::GroupingError;

/// Folds `secondary` into `primary`, choosing `primary` as whichever of the
/// two groups [`pick_primary`] prefers, and returns the resulting primary.
///
/// Ordering is deliberate: every face doc is repointed at the primary group
/// *before* the secondary group doc is deleted. If a crash lands between
/// those two steps, the secondary group doc is left dangling; this is
/// harmless, since the face doc is what every lookup trusts, and a
/// reconciler can clean up the leftover doc later.
pub async fn merge_groups<S: Store>(
    store: &S,
    user_id: &str,
    a: Group,
    b: Group,
) -> Result<Group, GroupingError> {
    let (mut primary, secondary) = pick_primary(a, b);

    let faces = store.list_faces_by_group(user_id, &secondary.group_id).await?;
    for mut face in faces {
        face.group_id = primary.group_id.clone();
        if let Err(err) = store.put_face(&face).await {
            error!(
                face_id = %face.face_id,
                group_id = %primary.group_id,
                error = %err,
                "failed to repoint face doc during merge; reconciler will need to repair it"
            );
        }
    }

    let face_ids: BTreeSet<String> = primary
        .face_ids
        .iter()
        .cloned()
        .chain(secondary.face_ids.iter().cloned())
        .collect();
    let file_ids: BTreeSet<String> = primary
        .file_ids
        .iter()
        .cloned()
        .chain(secondary.file_ids.iter().cloned())
        .collect();

    primary.face_ids = face_ids.into_iter().collect();
    primary.file_ids = file_ids.into_iter().collect();
    primary.recompute_face_count();
    primary.merged_from.push(secondary.group_id.clone());
    primary.updated_at = Utc::now();

    let primary = store.put_group(&primary).await?;
    store.delete_group(user_id, &secondary.group_id).await?;

    Ok(primary)
}

/// Picks the primary of a two-way merge: earliest `created_at`, tie-broken
/// by the smaller `group_id`. Returns `(primary, secondary)`.
#[must_use]
pub fn pick_primary(a: Group, b: Group) -> (Group, Group) {
    let a_first = (a.created_at, &a.group_id) <= (b.created_at, &b.group_id);
    if a_first { (a, b) } else { (b, a) }
}

/// Folds an arbitrary number of groups into one, pairwise, left to right
/// using [`pick_primary`] at each step. Used both by batch processing's
/// `|G| >= 2` branch and by the `mergeGroups` manual operation.
pub async fn merge_all<S: Store>(
    store: &S,
    user_id: &str,
    groups: Vec<Group>,
) -> Result<Group, GroupingError> {
    let mut groups = groups.into_iter();
    let mut primary = groups
        .next()
        .expect("merge_all requires at least one group");

    for next in groups {
        primary = merge_groups(store, user_id, primary, next).await?;
    }

    Ok(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use grouping_store::InMemoryStore;
    use grouping_types::GroupStatus;

    fn group_at(group_id: &str, created_at_offset_secs: i64, face_ids: Vec<&str>) -> Group {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Group {
            group_id: group_id.to_string(),
            user_id: "user_1".to_string(),
            interview_id: None,
            face_ids: face_ids.into_iter().map(str::to_string).collect(),
            file_ids: vec![],
            face_count: 0,
            leader_face_id: None,
            leader_file_id: None,
            leader_bbox_left: None,
            leader_bbox_top: None,
            leader_bbox_width: None,
            leader_bbox_height: None,
            status: GroupStatus::Unreviewed,
            group_name: None,
            person_name: None,
            merged_from: vec![],
            created_at: base + Duration::seconds(created_at_offset_secs),
            updated_at: base + Duration::seconds(created_at_offset_secs),
        }
    }

    #[test]
    fn pick_primary_prefers_earliest_created_at() {
        let older = group_at("grp_b", 0, vec![]);
        let newer = group_at("grp_a", 10, vec![]);
        let (primary, secondary) = pick_primary(newer, older);
        assert_eq!(primary.group_id, "grp_b");
        assert_eq!(secondary.group_id, "grp_a");
    }

    #[test]
    fn pick_primary_tie_breaks_on_group_id() {
        let a = group_at("grp_aaa", 0, vec![]);
        let b = group_at("grp_bbb", 0, vec![]);
        let (primary, _) = pick_primary(b, a);
        assert_eq!(primary.group_id, "grp_aaa");
    }

    #[tokio::test]
    async fn merge_unions_face_ids_and_dedupes() {
        let store = InMemoryStore::new();
        let a = group_at("grp_a", 0, vec!["f1", "f2"]);
        let b = group_at("grp_b", 10, vec!["f2", "f3"]);
        store.put_group(&a).await.unwrap();
        store.put_group(&b).await.unwrap();

        let merged = merge_groups(&store, "user_1", a, b).await.unwrap();

        assert_eq!(merged.group_id, "grp_a");
        assert_eq!(merged.face_ids, vec!["f1", "f2", "f3"]);
        assert_eq!(merged.face_count, 3);
        assert_eq!(merged.merged_from, vec!["grp_b"]);
        assert!(store.get_group("user_1", "grp_b").await.unwrap().is_none());
    }
}
