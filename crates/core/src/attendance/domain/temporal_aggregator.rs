use std::collections::{BTreeSet, HashMap, VecDeque};

use thiserror::Error;

use crate::attendance::domain::attendance_report::{AggregatedVerdict, AttendanceReport};
use crate::recognition::domain::match_result::{MatchLabel, MatchResult};

#[derive(Error, Debug, PartialEq)]
pub enum AggregatorError {
    #[error("window size must be at least 1")]
    EmptyWindow,
    #[error("presence ratio must be between 0.0 and 1.0, got {0}")]
    InvalidRatio(f64),
}

/// Known labels matched in one frame, plus the unknown-face count.
#[derive(Clone, Debug, Default)]
struct FrameRecord {
    scores: HashMap<String, f64>,
    unidentified: usize,
}

/// Sliding window over per-frame match results.
///
/// Holds the last `window_size` frames (FIFO eviction) and turns them into
/// one verdict per identity, so a single missed or spurious frame does not
/// flip attendance.
pub struct TemporalAggregator {
    window_size: usize,
    presence_ratio: f64,
    window: VecDeque<FrameRecord>,
}

impl TemporalAggregator {
    pub fn new(window_size: usize, presence_ratio: f64) -> Result<Self, AggregatorError> {
        if window_size == 0 {
            return Err(AggregatorError::EmptyWindow);
        }
        if !(0.0..=1.0).contains(&presence_ratio) {
            return Err(AggregatorError::InvalidRatio(presence_ratio));
        }
        Ok(Self {
            window_size,
            presence_ratio,
            window: VecDeque::with_capacity(window_size),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Records one frame's results, evicting the oldest frame when full.
    pub fn push(&mut self, results: &[MatchResult]) {
        let mut record = FrameRecord::default();
        for result in results {
            match &result.label {
                MatchLabel::Known(label) => {
                    let best = record.scores.entry(label.clone()).or_insert(result.score);
                    *best = best.max(result.score);
                }
                MatchLabel::Unmatched => record.unidentified += 1,
            }
        }

        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(record);
    }

    /// Builds the verdict set for the frames currently held.
    ///
    /// Every gallery label gets a verdict (in gallery order), followed by any
    /// label seen in the window that is no longer in the gallery, sorted.
    pub fn report<'a, I>(&self, gallery_labels: I) -> AttendanceReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let frames = self.window.len();
        if frames == 0 {
            return AttendanceReport::default();
        }

        // label → (frames observed, score sum)
        let mut observed: HashMap<&str, (usize, f64)> = HashMap::new();
        for record in &self.window {
            for (label, score) in &record.scores {
                let entry = observed.entry(label.as_str()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += score;
            }
        }

        let mut labels: Vec<&str> = Vec::new();
        let mut listed: BTreeSet<&str> = BTreeSet::new();
        for label in gallery_labels {
            if listed.insert(label) {
                labels.push(label);
            }
        }
        let extra: BTreeSet<&str> = observed
            .keys()
            .copied()
            .filter(|l| !listed.contains(l))
            .collect();

        let verdicts = labels
            .into_iter()
            .map(|label| (label, observed.get(label).copied()))
            .chain(extra.into_iter().map(|label| (label, observed.get(label).copied())))
            .map(|(label, stats)| self.verdict(label, stats, frames))
            .collect();

        AttendanceReport {
            window_frame_count: frames,
            verdicts,
            unidentified_events: self.window.iter().map(|r| r.unidentified).sum(),
        }
    }

    fn verdict(
        &self,
        label: &str,
        stats: Option<(usize, f64)>,
        frames: usize,
    ) -> AggregatedVerdict {
        let (count, sum) = stats.unwrap_or((0, 0.0));
        let mean_score = if count > 0 { sum / count as f64 } else { 0.0 };
        AggregatedVerdict {
            label: label.to_string(),
            observed_frame_count: count,
            window_frame_count: frames,
            mean_score,
            present: count as f64 / frames as f64 >= self.presence_ratio,
        }
    }
}
