use grouping_store::Store;
use tracing::info;

use crate::GroupingError;

/// Repairs the dangling-reference case the merge primitive can leave behind:
/// a group doc whose `faceIds` still lists a face that has since been
/// repointed (by a completed merge) at a different group, because the
/// secondary group's doc-delete step never ran. Per the convergence rule
/// the face doc is authoritative, so any `faceId` in a group's `faceIds`
/// that no longer points back at that group is simply dropped from the
/// list rather than chased to wherever it now lives.
///
/// Intended to run periodically as a background sweep, not inline with any
/// request path.
pub async fn reconcile_dangling_groups<S: Store>(
    store: &S,
    user_id: &str,
) -> Result<u64, GroupingError> {
    let mut repaired = 0u64;

    for mut group in store.list_groups(user_id).await? {
        let mut live_face_ids = Vec::with_capacity(group.face_ids.len());
        for face_id in &group.face_ids {
            match store.get_face(user_id, face_id).await? {
                Some(face) if face.group_id == group.group_id => live_face_ids.push(face_id.clone()),
                _ => {}
            }
        }

        if live_face_ids.len() == group.face_ids.len() {
            continue;
        }

        group.face_ids = live_face_ids;
        group.recompute_face_count();

        if let Some(leader_id) = group.leader_face_id.clone() {
            if !group.face_ids.contains(&leader_id) {
                match group.face_ids.first().cloned() {
                    Some(next_id) => match store.get_face(user_id, &next_id).await? {
                        Some(face) => {
                            group.set_leader(face.face_id, face.file_id, face.bounding_box());
                        }
                        None => group.clear_leader(),
                    },
                    None => group.clear_leader(),
                }
            }
        }

        store.put_group(&group).await?;
        repaired += 1;
    }

    info!(user_id, repaired, "reconciled dangling group references");
    Ok(repaired)
}
