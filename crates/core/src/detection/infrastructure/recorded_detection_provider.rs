use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::detection::domain::detection_provider::{
    DetectionProvider, FrameDetections, ProviderError,
};

/// Replays pre-recorded detection results by frame index.
///
/// Used for offline runs of a captured session: inference already happened
/// elsewhere and the engine only needs the structured records.
pub struct RecordedDetectionProvider {
    frames: Arc<HashMap<usize, FrameDetections>>,
}

impl RecordedDetectionProvider {
    pub fn new(frames: Arc<HashMap<usize, FrameDetections>>) -> Self {
        Self { frames }
    }

    /// Indexes `frames` by frame index; a repeated index is an error.
    pub fn from_frames(frames: Vec<FrameDetections>) -> Result<Self, ProviderError> {
        let mut map = HashMap::with_capacity(frames.len());
        for frame in frames {
            match map.entry(frame.index) {
                Entry::Occupied(_) => return Err(ProviderError::DuplicateFrame(frame.index)),
                Entry::Vacant(slot) => {
                    slot.insert(frame);
                }
            }
        }
        Ok(Self::new(Arc::new(map)))
    }

    /// Recorded frame indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.frames.keys().copied().collect();
        indices.sort_unstable();
        indices
    }
}

impl DetectionProvider for RecordedDetectionProvider {
    fn name(&self) -> &str {
        "recorded"
    }

    fn detect(&mut self, frame_index: usize) -> Result<FrameDetections, ProviderError> {
        self.frames
            .get(&frame_index)
            .cloned()
            .ok_or(ProviderError::MissingFrame(frame_index))
    }
}
