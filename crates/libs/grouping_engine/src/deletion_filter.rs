use grouping_types::{BoundingBox, DeletedFace, FaceInput};

/// Drops faces whose bounding box matches a tombstoned box within
/// tolerance. The upstream engine re-indexes images between runs and issues
/// fresh face IDs, but bounding boxes are stable, so tombstones are matched
/// on geometry rather than identity. A face without a bounding box cannot be
/// compared and is kept.
#[must_use]
pub fn filter_tombstoned(
    faces: Vec<FaceInput>,
    deleted_faces: &[DeletedFace],
    tolerance: f32,
) -> Vec<FaceInput> {
    faces
        .into_iter()
        .filter(|face| {
            let Some(bbox) = face.bounding_box.as_ref().and_then(|raw| raw.validate()) else {
                return true;
            };
            !is_tombstoned(&bbox, deleted_faces, tolerance)
        })
        .collect()
}

fn is_tombstoned(bbox: &BoundingBox, deleted_faces: &[DeletedFace], tolerance: f32) -> bool {
    deleted_faces
        .iter()
        .any(|tombstone| bbox.within_tolerance(&tombstone.bounding_box, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grouping_types::RawBoundingBox;
    use rstest::rstest;

    fn face_with_box(face_id: &str, left: f32, top: f32, width: f32, height: f32) -> FaceInput {
        FaceInput {
            face_id: face_id.to_string(),
            bounding_box: Some(RawBoundingBox {
                left: Some(left),
                top: Some(top),
                width: Some(width),
                height: Some(height),
            }),
            confidence: None,
            matched_face_ids: None,
            group_id: None,
        }
    }

    fn tombstone_at(left: f32, top: f32, width: f32, height: f32) -> DeletedFace {
        DeletedFace { bounding_box: BoundingBox { left, top, width, height } }
    }

    #[rstest]
    #[case::within_tolerance(face_with_box("f1", 0.11, 0.20, 0.30, 0.40), 0)]
    #[case::outside_tolerance(face_with_box("f1", 0.30, 0.20, 0.30, 0.40), 1)]
    fn matches_tombstone_by_geometry(#[case] face: FaceInput, #[case] expected_len: usize) {
        let tombstones = vec![tombstone_at(0.10, 0.20, 0.30, 0.40)];
        let kept = filter_tombstoned(vec![face], &tombstones, 0.05);
        assert_eq!(kept.len(), expected_len);
    }

    #[test]
    fn drops_only_the_matching_face_among_several() {
        let tombstones = vec![tombstone_at(0.10, 0.20, 0.30, 0.40)];
        let faces = vec![
            face_with_box("f1", 0.11, 0.20, 0.30, 0.40),
            face_with_box("f2", 0.80, 0.80, 0.10, 0.10),
        ];

        let kept = filter_tombstoned(faces, &tombstones, 0.05);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].face_id, "f2");
    }

    #[test]
    fn keeps_face_without_a_bounding_box() {
        let tombstones = vec![tombstone_at(0.10, 0.20, 0.30, 0.40)];
        let faces = vec![FaceInput {
            face_id: "f1".into(),
            bounding_box: None,
            confidence: None,
            matched_face_ids: None,
            group_id: None,
        }];

        let kept = filter_tombstoned(faces, &tombstones, 0.05);
        assert_eq!(kept.len(), 1);
    }
}
