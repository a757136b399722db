//! Maximum-total-similarity assignment (linear assignment via `lapjv`).
//!
//! Same contract as the greedy matcher, but the outcome no longer depends on
//! detection order: when two detections compete for one identity, the
//! pairing with the higher combined score wins.

use std::collections::HashSet;

use lapjv::Matrix;

use crate::detection::domain::detection::Detection;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::identity_matcher::{IdentityMatcher, MatchError, ScoreMatrix};
use crate::recognition::domain::match_result::MatchResult;

pub struct OptimalMatcher;

impl OptimalMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OptimalMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMatcher for OptimalMatcher {
    fn name(&self) -> &'static str {
        "optimal"
    }

    fn assign(
        &self,
        detections: &[Detection],
        gallery: &Gallery,
        excluded: &HashSet<String>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let matrix = ScoreMatrix::build(detections, gallery, excluded)?;
        let (rows, cols) = (matrix.rows(), matrix.cols());
        if rows == 0 || cols == 0 {
            return Ok(vec![MatchResult::unmatched(); rows]);
        }

        // Square cost matrix. Padding cells mean "unmatched"; every assignment
        // uses exactly min(rows, cols) real cells, so shifting scores into
        // [0, 2] leaves the optimum unchanged.
        let size = rows.max(cols);
        let cost = Matrix::from_shape_fn((size, size), |(r, c)| {
            if r < rows && c < cols {
                1.0 - matrix.score(r, c)
            } else {
                0.0
            }
        });

        let assignment = solve_min_cost(&cost)?;
        let results = (0..rows)
            .map(|r| {
                let c = assignment[r];
                if c < cols {
                    MatchResult::known(matrix.label(c), matrix.score(r, c))
                } else {
                    MatchResult::unmatched()
                }
            })
            .collect();
        Ok(results)
    }
}

/// Minimum-cost perfect matching on a square matrix (Jonker-Volgenant).
/// Returns the column assigned to each row.
fn solve_min_cost(cost: &Matrix<f64>) -> Result<Vec<usize>, MatchError> {
    lapjv::lapjv(cost)
        .map(|(row_to_col, _)| row_to_col)
        .map_err(|e| MatchError::Assignment(format!("{e:?}")))
}
