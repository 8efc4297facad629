use serde::{Deserialize, Serialize};

/// A face region within its source image, as fractions of the image's
/// dimensions (each coordinate lies in `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// True if every coordinate of `self` is within `tolerance` of `other`.
    #[must_use]
    pub fn within_tolerance(&self, other: &BoundingBox, tolerance: f32) -> bool {
        (self.left - other.left).abs() < tolerance
            && (self.top - other.top).abs() < tolerance
            && (self.width - other.width).abs() < tolerance
            && (self.height - other.height).abs() < tolerance
    }
}

/// The wire shape of a bounding box, where any coordinate may be absent.
/// A face presented to `processBatch` with a missing or partial box is
/// rejected rather than defaulted, per the "reject if any coordinate is
/// undefined" edge case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBoundingBox {
    #[serde(rename = "Left")]
    pub left: Option<f32>,
    #[serde(rename = "Top")]
    pub top: Option<f32>,
    #[serde(rename = "Width")]
    pub width: Option<f32>,
    #[serde(rename = "Height")]
    pub height: Option<f32>,
}

impl RawBoundingBox {
    #[must_use]
    pub fn validate(&self) -> Option<BoundingBox> {
        Some(BoundingBox {
            left: self.left?,
            top: self.top?,
            width: self.width?,
            height: self.height?,
        })
    }
}

impl From<BoundingBox> for RawBoundingBox {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            left: Some(bbox.left),
            top: Some(bbox.top),
            width: Some(bbox.width),
            height: Some(bbox.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: BoundingBox = BoundingBox { left: 0.10, top: 0.20, width: 0.30, height: 0.40 };

    #[rstest]
    #[case::small_drift(BoundingBox { left: 0.12, top: 0.21, width: 0.29, height: 0.41 }, true)]
    #[case::large_left_drift(BoundingBox { left: 0.20, top: 0.20, width: 0.30, height: 0.40 }, false)]
    #[case::large_height_drift(BoundingBox { left: 0.10, top: 0.20, width: 0.30, height: 0.50 }, false)]
    fn within_tolerance(#[case] other: BoundingBox, #[case] expected: bool) {
        assert_eq!(BASE.within_tolerance(&other, 0.05), expected);
    }

    #[test]
    fn raw_bounding_box_rejects_missing_coordinate() {
        let raw = RawBoundingBox { left: Some(0.1), top: Some(0.2), width: None, height: Some(0.4) };
        assert!(raw.validate().is_none());
    }

    #[test]
    fn raw_bounding_box_accepts_complete_box() {
        let raw = RawBoundingBox { left: Some(0.1), top: Some(0.2), width: Some(0.3), height: Some(0.4) };
        assert_eq!(
            raw.validate(),
            Some(BoundingBox { left: 0.1, top: 0.2, width: 0.3, height: 0.4 })
        );
    }
}
