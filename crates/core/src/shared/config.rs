use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_FUSION_IOU_THRESHOLD, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_FACE_SIZE,
    DEFAULT_PRESENCE_RATIO, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_WINDOW_SIZE,
    MIN_CONFIDENCE_RANGE, MIN_FACE_SIZE_RANGE,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// How detections are paired with gallery identities each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStrategy {
    /// Input-order greedy assignment.
    #[default]
    Greedy,
    /// Maximum total similarity (Hungarian).
    Optimal,
}

impl std::fmt::Display for AssignmentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStrategy::Greedy => write!(f, "greedy"),
            AssignmentStrategy::Optimal => write!(f, "optimal"),
        }
    }
}

impl std::str::FromStr for AssignmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(AssignmentStrategy::Greedy),
            "optimal" => Ok(AssignmentStrategy::Optimal),
            other => Err(format!(
                "assignment strategy must be 'greedy' or 'optimal', got '{other}'"
            )),
        }
    }
}

/// Pre-fusion filtering applied to automatic detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub min_confidence: f64,
    pub min_face_size: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

/// Engine settings for one session. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fusion_iou_threshold: f64,
    pub similarity_threshold: f64,
    pub reduced_occlusion: bool,
    pub window_size: usize,
    pub presence_ratio: f64,
    pub strategy: AssignmentStrategy,
    pub detection: DetectionParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fusion_iou_threshold: DEFAULT_FUSION_IOU_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            reduced_occlusion: false,
            window_size: DEFAULT_WINDOW_SIZE,
            presence_ratio: DEFAULT_PRESENCE_RATIO,
            strategy: AssignmentStrategy::Greedy,
            detection: DetectionParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every field and reports all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.fusion_iou_threshold) {
            errors.push(format!(
                "fusion_iou_threshold must be between 0.0 and 1.0, got {}",
                self.fusion_iou_threshold
            ));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            errors.push(format!(
                "similarity_threshold must be between -1.0 and 1.0, got {}",
                self.similarity_threshold
            ));
        }
        if self.window_size == 0 {
            errors.push("window_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.presence_ratio) {
            errors.push(format!(
                "presence_ratio must be between 0.0 and 1.0, got {}",
                self.presence_ratio
            ));
        }
        let (lo, hi) = MIN_CONFIDENCE_RANGE;
        if !(lo..=hi).contains(&self.detection.min_confidence) {
            errors.push(format!(
                "min_confidence must be between {lo} and {hi}, got {}",
                self.detection.min_confidence
            ));
        }
        let (lo, hi) = MIN_FACE_SIZE_RANGE;
        if !(lo..=hi).contains(&self.detection.min_face_size) {
            errors.push(format!(
                "min_face_size must be between {lo} and {hi}, got {}",
                self.detection.min_face_size
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
