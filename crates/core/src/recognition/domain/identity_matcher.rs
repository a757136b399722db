use std::collections::HashSet;

use ndarray::Array2;
use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::match_result::MatchResult;
use crate::shared::embedding::cosine_similarity;

#[derive(Error, Debug, PartialEq)]
pub enum MatchError {
    #[error(
        "detection {index} has a {actual}-dimensional embedding but the gallery expects {expected}"
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("assignment solver failed: {0}")]
    Assignment(String),
}

/// Domain interface for one-to-one assignment of detections to identities.
///
/// Returns one result per detection, in input order. No two results in the
/// same call carry the same known label, and labels in `excluded` are never
/// assigned. Thresholding is left to the caller: the best available score is
/// always reported.
pub trait IdentityMatcher: Send {
    fn name(&self) -> &'static str;

    fn assign(
        &self,
        detections: &[Detection],
        gallery: &Gallery,
        excluded: &HashSet<String>,
    ) -> Result<Vec<MatchResult>, MatchError>;
}

/// Detection × candidate-entry similarity table for one frame.
///
/// Rows follow detection order, columns follow gallery order with excluded
/// labels left out. Each cell holds the best similarity between the
/// detection and any of that entry's reference embeddings.
pub struct ScoreMatrix<'g> {
    labels: Vec<&'g str>,
    scores: Array2<f64>,
}

impl<'g> ScoreMatrix<'g> {
    pub fn build(
        detections: &[Detection],
        gallery: &'g Gallery,
        excluded: &HashSet<String>,
    ) -> Result<Self, MatchError> {
        if let Some(expected) = gallery.dimension() {
            validate_dimensions(detections, expected)?;
        }

        let candidates: Vec<_> = gallery
            .entries()
            .iter()
            .filter(|e| !excluded.contains(&e.label))
            .collect();

        let mut scores = Array2::<f64>::zeros((detections.len(), candidates.len()));
        for (row, detection) in detections.iter().enumerate() {
            for (col, entry) in candidates.iter().enumerate() {
                scores[[row, col]] = entry
                    .embeddings
                    .iter()
                    .map(|reference| sanitize(cosine_similarity(&detection.embedding, reference)))
                    .fold(f64::NEG_INFINITY, f64::max);
            }
        }

        Ok(Self {
            labels: candidates.iter().map(|e| e.label.as_str()).collect(),
            scores,
        })
    }

    pub fn rows(&self) -> usize {
        self.scores.nrows()
    }

    pub fn cols(&self) -> usize {
        self.scores.ncols()
    }

    pub fn score(&self, row: usize, col: usize) -> f64 {
        self.scores[[row, col]]
    }

    pub fn label(&self, col: usize) -> &'g str {
        self.labels[col]
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// Highest-scoring column among those `available`; ties go to the
    /// lowest column, i.e. the first entry in gallery order.
    pub fn best_available(&self, row: usize, available: &[bool]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for col in 0..self.cols() {
            if !available[col] {
                continue;
            }
            let score = self.score(row, col);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((col, score));
            }
        }
        best
    }
}

fn validate_dimensions(detections: &[Detection], expected: usize) -> Result<(), MatchError> {
    for (index, detection) in detections.iter().enumerate() {
        if detection.embedding.len() != expected {
            return Err(MatchError::DimensionMismatch {
                index,
                expected,
                actual: detection.embedding.len(),
            });
        }
    }
    Ok(())
}

/// NaN embeddings score as the worst possible match.
fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        -1.0
    } else {
        score
    }
}
