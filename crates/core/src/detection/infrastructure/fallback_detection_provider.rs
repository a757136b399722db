use crate::detection::domain::detection_provider::{
    DetectionProvider, FrameDetections, ProviderError,
};

/// Tries an explicit, ordered list of providers until one succeeds.
///
/// Covers alternate model sources (e.g. a local model, then a bundled one)
/// without the matching core knowing anything about them.
pub struct FallbackDetectionProvider {
    providers: Vec<Box<dyn DetectionProvider>>,
}

impl FallbackDetectionProvider {
    pub fn new(providers: Vec<Box<dyn DetectionProvider>>) -> Self {
        Self { providers }
    }
}

impl DetectionProvider for FallbackDetectionProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    fn detect(&mut self, frame_index: usize) -> Result<FrameDetections, ProviderError> {
        if self.providers.is_empty() {
            return Err(ProviderError::NoProviders);
        }

        let mut failures = Vec::new();
        for provider in &mut self.providers {
            match provider.detect(frame_index) {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    log::warn!("Provider '{}' failed on frame {frame_index}: {e}", provider.name());
                    failures.push(format!("{}: {e}", provider.name()));
                }
            }
        }
        Err(ProviderError::AllFailed(failures))
    }
}
