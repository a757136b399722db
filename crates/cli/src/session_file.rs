use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use roster_core::detection::domain::detection::Detection;
use roster_core::detection::domain::detection_provider::FrameDetections;
use roster_core::detection::infrastructure::recorded_detection_provider::RecordedDetectionProvider;
use roster_core::recognition::domain::gallery::{Gallery, GalleryEntry};

/// A captured session: the enrolled roster plus per-frame detector output.
#[derive(Debug, Deserialize)]
pub struct SessionFile {
    pub gallery: Vec<GalleryEntry>,
    pub frames: Vec<SessionFrame>,
    /// Roster changes applied before the first frame at or after `before_frame`.
    #[serde(default)]
    pub gallery_updates: Vec<GalleryUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct SessionFrame {
    pub index: usize,
    #[serde(default)]
    pub passes: Vec<Vec<Detection>>,
    #[serde(default)]
    pub manual: Vec<Detection>,
    #[serde(default)]
    pub excluded_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryUpdate {
    pub before_frame: usize,
    pub gallery: Vec<GalleryEntry>,
}

/// One thing the replay loop does, in order.
#[derive(Debug)]
pub enum ReplayStep {
    ReplaceGallery(Arc<Gallery>),
    Frame {
        index: usize,
        excluded: HashSet<String>,
    },
}

pub struct ReplayPlan {
    pub gallery: Arc<Gallery>,
    pub provider: RecordedDetectionProvider,
    pub steps: Vec<ReplayStep>,
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read session {}: {e}", path.display()))?;
        let session: SessionFile = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid session file {}: {e}", path.display()))?;
        Ok(session)
    }

    /// Validates the session and orders frames and roster changes for replay.
    ///
    /// Frames run in ascending index order. Each gallery update lands before
    /// the first frame whose index is at least `before_frame`; updates past
    /// the last frame are applied at the end so they still shape the report.
    pub fn into_plan(self) -> Result<ReplayPlan, Box<dyn std::error::Error>> {
        let gallery = Arc::new(Gallery::new(self.gallery)?);

        let mut updates: BTreeMap<usize, Arc<Gallery>> = BTreeMap::new();
        for update in self.gallery_updates {
            let replacement = Arc::new(Gallery::new(update.gallery)?);
            if updates.insert(update.before_frame, replacement).is_some() {
                return Err(format!(
                    "More than one gallery update before frame {}",
                    update.before_frame
                )
                .into());
            }
        }

        let mut frames = self.frames;
        frames.sort_by_key(|f| f.index);

        let mut steps = Vec::with_capacity(frames.len() + updates.len());
        let mut detections = Vec::with_capacity(frames.len());
        let mut pending = updates.into_iter().peekable();
        for frame in frames {
            while let Some((_, replacement)) = pending.next_if(|(at, _)| *at <= frame.index) {
                steps.push(ReplayStep::ReplaceGallery(replacement));
            }
            steps.push(ReplayStep::Frame {
                index: frame.index,
                excluded: frame.excluded_labels.into_iter().collect(),
            });
            detections.push(
                FrameDetections::new(frame.index, frame.passes).with_manual(frame.manual),
            );
        }
        for (at, replacement) in pending {
            log::warn!("Gallery update before frame {at} comes after the last frame");
            steps.push(ReplayStep::ReplaceGallery(replacement));
        }

        Ok(ReplayPlan {
            gallery,
            provider: RecordedDetectionProvider::from_frames(detections)?,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SESSION: &str = r#"{
        "gallery": [
            {"label": "alice", "embeddings": [[1.0, 0.0]]},
            {"label": "bob", "embeddings": [[0.0, 1.0], [0.1, 0.9]]}
        ],
        "frames": [
            {
                "index": 0,
                "passes": [[{"bbox": {"x": 0, "y": 0, "width": 50, "height": 50},
                             "confidence": 0.9, "embedding": [1.0, 0.0]}]],
                "excluded_labels": ["bob"]
            },
            {
                "index": 1,
                "manual": [{"bbox": {"x": 10, "y": 10, "width": 40, "height": 40},
                            "confidence": 0.3, "embedding": [0.0, 1.0]}]
            }
        ],
        "gallery_updates": [
            {"before_frame": 1, "gallery": [{"label": "carol", "embeddings": [[1.0, 1.0]]}]}
        ]
    }"#;

    fn session(frames: &[usize], updates: &[usize]) -> SessionFile {
        SessionFile {
            gallery: vec![GalleryEntry::new("alice", vec![vec![1.0, 0.0]])],
            frames: frames
                .iter()
                .map(|&index| SessionFrame {
                    index,
                    passes: Vec::new(),
                    manual: Vec::new(),
                    excluded_labels: Vec::new(),
                })
                .collect(),
            gallery_updates: updates
                .iter()
                .map(|&before_frame| GalleryUpdate {
                    before_frame,
                    gallery: vec![GalleryEntry::new("carol", vec![vec![0.0, 1.0]])],
                })
                .collect(),
        }
    }

    /// Step trace: frame indices as numbers, gallery swaps as `None`.
    fn trace(plan: &ReplayPlan) -> Vec<Option<usize>> {
        plan.steps
            .iter()
            .map(|step| match step {
                ReplayStep::ReplaceGallery(_) => None,
                ReplayStep::Frame { index, .. } => Some(*index),
            })
            .collect()
    }

    #[test]
    fn test_load_and_plan() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SESSION.as_bytes()).unwrap();

        let plan = SessionFile::load(file.path()).unwrap().into_plan().unwrap();
        assert_eq!(plan.gallery.labels(), vec!["alice", "bob"]);
        assert_eq!(plan.provider.indices(), vec![0, 1]);
        assert_eq!(trace(&plan), vec![Some(0), None, Some(1)]);
        match &plan.steps[0] {
            ReplayStep::Frame { excluded, .. } => assert!(excluded.contains("bob")),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn test_manual_detections_tagged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SESSION.as_bytes()).unwrap();
        let mut plan = SessionFile::load(file.path()).unwrap().into_plan().unwrap();

        use roster_core::detection::domain::detection_provider::DetectionProvider;
        let frame = plan.provider.detect(1).unwrap();
        assert!(frame.manual[0].is_manual());
    }

    #[test]
    fn test_update_between_recorded_frames_applies_before_next_frame() {
        let plan = session(&[0, 2, 5], &[1]).into_plan().unwrap();
        assert_eq!(trace(&plan), vec![Some(0), None, Some(2), Some(5)]);
    }

    #[test]
    fn test_update_after_last_frame_still_applied() {
        let plan = session(&[0, 2], &[9]).into_plan().unwrap();
        assert_eq!(trace(&plan), vec![Some(0), Some(2), None]);
    }

    #[test]
    fn test_frames_replayed_in_index_order() {
        let plan = session(&[4, 0, 2], &[3, 0]).into_plan().unwrap();
        assert_eq!(trace(&plan), vec![None, Some(0), Some(2), None, Some(4)]);
    }

    #[test]
    fn test_duplicate_frame_index_rejected() {
        let err = session(&[0, 2, 2], &[]).into_plan().err().unwrap();
        assert!(err.to_string().contains("frame 2 recorded more than once"));
    }

    #[test]
    fn test_duplicate_update_rejected() {
        let err = session(&[0, 2], &[1, 1]).into_plan().err().unwrap();
        assert!(err.to_string().contains("before frame 1"));
    }

    #[test]
    fn test_duplicate_gallery_label_rejected() {
        let json = r#"{"gallery": [
            {"label": "a", "embeddings": [[1.0]]},
            {"label": "a", "embeddings": [[0.5]]}
        ], "frames": []}"#;
        let session: SessionFile = serde_json::from_str(json).unwrap();
        let err = session.into_plan().err().unwrap();
        assert!(err.to_string().contains("duplicate gallery label 'a'"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionFile::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read session"));
    }
}
