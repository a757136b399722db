use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection::{Detection, DetectionOrigin};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider '{provider}' failed: {message}")]
    Failed { provider: String, message: String },
    #[error("no detections recorded for frame {0}")]
    MissingFrame(usize),
    #[error("frame {0} recorded more than once")]
    DuplicateFrame(usize),
    #[error("all detection providers failed: {}", .0.join("; "))]
    AllFailed(Vec<String>),
    #[error("no detection providers configured")]
    NoProviders,
}

/// Everything an external detector produced for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub index: usize,
    /// Automatic passes in priority order; later passes refine earlier ones.
    #[serde(default)]
    pub passes: Vec<Vec<Detection>>,
    /// Operator-triggered detections, folded in after every pass.
    #[serde(default)]
    pub manual: Vec<Detection>,
}

impl FrameDetections {
    pub fn new(index: usize, passes: Vec<Vec<Detection>>) -> Self {
        Self {
            index,
            passes,
            manual: Vec::new(),
        }
    }

    /// Attaches operator detections, tagging each as manual.
    pub fn with_manual(mut self, manual: Vec<Detection>) -> Self {
        self.manual = manual
            .into_iter()
            .map(|mut d| {
                d.origin = DetectionOrigin::Manual;
                d
            })
            .collect();
        self
    }

    pub fn total(&self) -> usize {
        self.passes.iter().map(Vec::len).sum::<usize>() + self.manual.len()
    }
}

/// Domain interface for the external detection/embedding collaborator.
///
/// Implementations own their capture source and inference backend; the
/// engine only asks for a frame by index. Stateful implementations are
/// allowed, hence `&mut self`.
pub trait DetectionProvider: Send {
    fn name(&self) -> &str;

    fn detect(&mut self, frame_index: usize) -> Result<FrameDetections, ProviderError>;
}
