use crate::recognition::domain::match_result::MatchResult;
use crate::shared::constants::{
    DEFAULT_SIMILARITY_THRESHOLD, MIN_SIMILARITY_THRESHOLD, REDUCED_OCCLUSION_OFFSET,
};

/// Caller-side policy deciding whether a match counts as a known identity.
///
/// Reduced-occlusion mode lowers the threshold by a fixed offset, floored at
/// [`MIN_SIMILARITY_THRESHOLD`], to tolerate partially covered faces. A base
/// already under the floor is left as is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityThreshold {
    base: f64,
    reduced_occlusion: bool,
}

impl SimilarityThreshold {
    pub fn new(base: f64, reduced_occlusion: bool) -> Self {
        Self {
            base,
            reduced_occlusion,
        }
    }

    pub fn effective(&self) -> f64 {
        if self.reduced_occlusion {
            (self.base - REDUCED_OCCLUSION_OFFSET).max(MIN_SIMILARITY_THRESHOLD.min(self.base))
        } else {
            self.base
        }
    }

    pub fn is_known(&self, result: &MatchResult) -> bool {
        result.is_matched() && result.score >= self.effective()
    }

    /// Demotes below-threshold matches to unmatched.
    pub fn apply(&self, result: &MatchResult) -> MatchResult {
        if self.is_known(result) {
            result.clone()
        } else {
            MatchResult::unmatched()
        }
    }
}

impl Default for SimilarityThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD, false)
    }
}
