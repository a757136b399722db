//! Optional 5-point landmarks reported alongside a detection.
//!
//! Only used to place identity labels: the weighted centroid is steadier
//! than the bbox center when the face is partially turned.

use serde::{Deserialize, Serialize};

/// Landmark weights: [left_eye, right_eye, nose, left_mouth, right_mouth].
const WEIGHTS: [f64; 5] = [2.0, 2.0, 3.0, 1.0, 1.0];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    /// Points with x <= 0 are treated as not visible.
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn has_visible(&self) -> bool {
        self.points.iter().any(|(x, _)| *x > 0.0)
    }

    /// Weighted centroid of the visible points, `None` when none are visible.
    pub fn center(&self) -> Option<(f64, f64)> {
        let (wx, wy, w) = self
            .points
            .iter()
            .zip(WEIGHTS)
            .filter(|((x, _), _)| *x > 0.0)
            .fold((0.0, 0.0, 0.0), |(wx, wy, w), ((x, y), weight)| {
                (wx + x * weight, wy + y * weight, w + weight)
            });

        if w == 0.0 {
            return None;
        }
        Some((wx / w, wy / w))
    }
}
