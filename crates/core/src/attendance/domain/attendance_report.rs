use serde::{Deserialize, Serialize};

/// Stabilized presence verdict for one identity over the current window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVerdict {
    pub label: String,
    pub observed_frame_count: usize,
    pub window_frame_count: usize,
    /// Mean similarity over the frames where the label was matched; 0 if none.
    pub mean_score: f64,
    pub present: bool,
}

impl AggregatedVerdict {
    pub fn presence_ratio(&self) -> f64 {
        if self.window_frame_count == 0 {
            return 0.0;
        }
        self.observed_frame_count as f64 / self.window_frame_count as f64
    }
}

/// Attendance-style summary of one window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub window_frame_count: usize,
    pub verdicts: Vec<AggregatedVerdict>,
    /// Detections in the window that matched no known identity. Unknown
    /// faces are counted, not tracked.
    pub unidentified_events: usize,
}

impl AttendanceReport {
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn verdict(&self, label: &str) -> Option<&AggregatedVerdict> {
        self.verdicts.iter().find(|v| v.label == label)
    }

    pub fn present_labels(&self) -> Vec<&str> {
        self.verdicts
            .iter()
            .filter(|v| v.present)
            .map(|v| v.label.as_str())
            .collect()
    }
}
