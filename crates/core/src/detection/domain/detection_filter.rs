use crate::detection::domain::detection::Detection;
use crate::shared::config::DetectionParams;

/// Drops weak or tiny automatic detections before fusion.
///
/// A detection passes when `confidence >= min_confidence` and the shorter
/// bbox side is at least `min_face_size`. Manual detections always pass:
/// the operator asked for them explicitly.
pub struct DetectionFilter {
    min_confidence: f64,
    min_face_size: f64,
}

impl DetectionFilter {
    pub fn new(params: &DetectionParams) -> Self {
        Self {
            min_confidence: params.min_confidence,
            min_face_size: params.min_face_size as f64,
        }
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        if detection.is_manual() {
            return true;
        }
        let side = detection.bbox.width.min(detection.bbox.height);
        detection.confidence >= self.min_confidence && side >= self.min_face_size
    }

    pub fn apply(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| self.accepts(d))
            .cloned()
            .collect()
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::new(&DetectionParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;
    use rstest::rstest;

    fn filter() -> DetectionFilter {
        DetectionFilter::new(&DetectionParams {
            min_confidence: 0.5,
            min_face_size: 20,
        })
    }

    fn det(w: f64, h: f64, confidence: f64) -> Detection {
        Detection::new(BoundingBox::new(0.0, 0.0, w, h), confidence, vec![1.0])
    }

    #[rstest]
    #[case::passes(det(40.0, 40.0, 0.9), true)]
    #[case::confidence_at_bound(det(40.0, 40.0, 0.5), true)]
    #[case::low_confidence(det(40.0, 40.0, 0.49), false)]
    #[case::size_at_bound(det(20.0, 60.0, 0.9), true)]
    #[case::too_narrow(det(19.0, 60.0, 0.9), false)]
    #[case::too_short(det(60.0, 10.0, 0.9), false)]
    fn test_accepts(#[case] d: Detection, #[case] expected: bool) {
        assert_eq!(filter().accepts(&d), expected);
    }

    #[test]
    fn test_manual_bypasses_filter() {
        let d = Detection::manual(BoundingBox::new(0.0, 0.0, 5.0, 5.0), 0.01, vec![1.0]);
        assert!(filter().accepts(&d));
    }

    #[test]
    fn test_apply_preserves_order() {
        let input = vec![det(40.0, 40.0, 0.9), det(5.0, 5.0, 0.9), det(30.0, 30.0, 0.7)];
        let result = filter().apply(&input);
        assert_eq!(result, vec![input[0].clone(), input[2].clone()]);
    }

    #[test]
    fn test_apply_empty() {
        assert!(filter().apply(&[]).is_empty());
    }
}
