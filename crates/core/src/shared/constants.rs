/// Fixed overlap separating "same face seen twice" from "two adjacent faces"
/// while folding detection passes together.
pub const MERGE_IOU_THRESHOLD: f64 = 0.3;

/// Default threshold for the final deduplication pass.
pub const DEFAULT_FUSION_IOU_THRESHOLD: f64 = 0.3;

/// Below this cosine similarity a match is reported as unknown.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;

/// How much reduced-occlusion mode relaxes the similarity threshold.
pub const REDUCED_OCCLUSION_OFFSET: f64 = 0.05;

/// Floor for the relaxed threshold.
pub const MIN_SIMILARITY_THRESHOLD: f64 = 0.05;

pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_PRESENCE_RATIO: f64 = 0.6;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;
pub const MIN_CONFIDENCE_RANGE: (f64, f64) = (0.01, 1.0);

/// Shorter bbox side in pixels.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 20;
pub const MIN_FACE_SIZE_RANGE: (u32, u32) = (10, 100);
