use std::collections::HashSet;

use crate::detection::domain::detection::Detection;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::identity_matcher::{IdentityMatcher, MatchError, ScoreMatrix};
use crate::recognition::domain::match_result::MatchResult;

/// Input-order greedy assignment.
///
/// Each detection, in turn, takes its best still-unclaimed label. Not
/// globally optimal: when two detections both resemble the same identity,
/// whichever comes first wins it.
pub struct GreedyMatcher;

impl GreedyMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMatcher for GreedyMatcher {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn assign(
        &self,
        detections: &[Detection],
        gallery: &Gallery,
        excluded: &HashSet<String>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let matrix = ScoreMatrix::build(detections, gallery, excluded)?;
        let mut available = vec![true; matrix.cols()];

        let results = (0..matrix.rows())
            .map(|row| match matrix.best_available(row, &available) {
                Some((col, score)) => {
                    available[col] = false;
                    MatchResult::known(matrix.label(col), score)
                }
                None => MatchResult::unmatched(),
            })
            .collect();
        Ok(results)
    }
}
