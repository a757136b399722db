use serde::{Deserialize, Serialize};

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;

/// Who produced a detection.
///
/// Manual detections come from an operator re-running detection at a point
/// of interest. Fusion never merges them away; the matcher ignores the tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionOrigin {
    #[default]
    Automatic,
    Manual,
}

/// One face observed in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
    /// Identity embedding from the external model, not necessarily unit-length.
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub origin: DetectionOrigin,
    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64, embedding: Vec<f32>) -> Self {
        Self {
            bbox,
            confidence,
            embedding,
            origin: DetectionOrigin::Automatic,
            landmarks: None,
        }
    }

    pub fn manual(bbox: BoundingBox, confidence: f64, embedding: Vec<f32>) -> Self {
        Self {
            origin: DetectionOrigin::Manual,
            ..Self::new(bbox, confidence, embedding)
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn is_manual(&self) -> bool {
        self.origin == DetectionOrigin::Manual
    }

    pub fn iou(&self, other: &Detection) -> f64 {
        self.bbox.iou(&other.bbox)
    }

    /// Where an overlay should pin this face's label.
    pub fn anchor(&self) -> (f64, f64) {
        self.landmarks
            .as_ref()
            .and_then(FaceLandmarks::center)
            .unwrap_or_else(|| self.bbox.center())
    }
}
