use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::attendance::domain::attendance_report::AttendanceReport;
use crate::attendance::domain::temporal_aggregator::{AggregatorError, TemporalAggregator};
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_filter::DetectionFilter;
use crate::detection::domain::detection_fusion::DetectionFusion;
use crate::detection::domain::detection_provider::{FrameDetections, ProviderError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::gallery::{Gallery, GalleryError};
use crate::recognition::domain::identity_matcher::{IdentityMatcher, MatchError};
use crate::recognition::domain::match_result::{IdentifiedFace, MatchResult};
use crate::recognition::domain::similarity_threshold::SimilarityThreshold;
use crate::recognition::infrastructure::greedy_matcher::GreedyMatcher;
use crate::recognition::infrastructure::optimal_matcher::OptimalMatcher;
use crate::shared::config::{AssignmentStrategy, ConfigError, EngineConfig};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// What the consumer gets back for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    pub index: usize,
    /// Fused detections with their (thresholded) identities, for display.
    pub faces: Vec<IdentifiedFace>,
    /// Present once the window holds `window_size` frames.
    pub report: Option<AttendanceReport>,
}

impl FrameOutcome {
    pub fn known_count(&self) -> usize {
        self.faces.iter().filter(|f| f.result.is_matched()).count()
    }
}

pub fn build_matcher(strategy: AssignmentStrategy) -> Box<dyn IdentityMatcher> {
    match strategy {
        AssignmentStrategy::Greedy => Box::new(GreedyMatcher::new()),
        AssignmentStrategy::Optimal => Box::new(OptimalMatcher::new()),
    }
}

/// One attendance session: filter → fuse → match → threshold → aggregate.
///
/// Owns the rolling window, so a session must be driven from a single
/// thread (see `ThreadedSessionWorker`). The gallery is an immutable
/// snapshot; roster changes swap it between frames.
pub struct ProcessFrameUseCase {
    filter: DetectionFilter,
    fusion: DetectionFusion,
    matcher: Box<dyn IdentityMatcher>,
    threshold: SimilarityThreshold,
    aggregator: TemporalAggregator,
    gallery: Arc<Gallery>,
    logger: Box<dyn PipelineLogger>,
}

impl ProcessFrameUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filter: DetectionFilter,
        fusion: DetectionFusion,
        matcher: Box<dyn IdentityMatcher>,
        threshold: SimilarityThreshold,
        aggregator: TemporalAggregator,
        gallery: Arc<Gallery>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            filter,
            fusion,
            matcher,
            threshold,
            aggregator,
            gallery,
            logger,
        }
    }

    pub fn from_config(
        config: &EngineConfig,
        gallery: Arc<Gallery>,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let aggregator = TemporalAggregator::new(config.window_size, config.presence_ratio)?;
        let matcher = build_matcher(config.strategy);
        let threshold =
            SimilarityThreshold::new(config.similarity_threshold, config.reduced_occlusion);
        log::debug!(
            "Session: {} matcher, window {}, presence {}, threshold {}",
            matcher.name(),
            config.window_size,
            config.presence_ratio,
            threshold.effective()
        );
        Ok(Self::new(
            DetectionFilter::new(&config.detection),
            DetectionFusion::new(config.fusion_iou_threshold),
            matcher,
            threshold,
            aggregator,
            gallery,
            logger,
        ))
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    pub fn gallery(&self) -> &Arc<Gallery> {
        &self.gallery
    }

    /// Swaps in a new roster snapshot. Takes effect from the next frame.
    pub fn replace_gallery(&mut self, gallery: Arc<Gallery>) {
        self.logger.info(&format!(
            "Gallery replaced: {} → {} identities",
            self.gallery.len(),
            gallery.len()
        ));
        self.gallery = gallery;
    }

    pub fn execute(&mut self, frame: &FrameDetections) -> Result<FrameOutcome, EngineError> {
        self.execute_excluding(frame, &HashSet::new())
    }

    /// Processes one frame, never assigning labels in `excluded`.
    ///
    /// A matching error leaves the window untouched.
    pub fn execute_excluding(
        &mut self,
        frame: &FrameDetections,
        excluded: &HashSet<String>,
    ) -> Result<FrameOutcome, EngineError> {
        let start = Instant::now();
        let passes: Vec<Vec<Detection>> =
            frame.passes.iter().map(|p| self.filter.apply(p)).collect();
        let fused = self.fusion.fuse(&passes, &frame.manual);
        self.logger.timing("fuse", elapsed_ms(start));

        let start = Instant::now();
        let results = self.matcher.assign(&fused, &self.gallery, excluded)?;
        self.logger.timing("match", elapsed_ms(start));

        let start = Instant::now();
        let results: Vec<MatchResult> = results.iter().map(|r| self.threshold.apply(r)).collect();
        self.aggregator.push(&results);
        let report = self.aggregator.is_full().then(|| self.report());
        self.logger.timing("aggregate", elapsed_ms(start));

        let unidentified = results.iter().filter(|r| !r.is_matched()).count();
        self.logger.metric("detections", fused.len() as f64);
        self.logger.metric("unidentified", unidentified as f64);
        self.logger.frame_done(frame.index);
        log::debug!(
            "Frame {}: {} raw → {} fused, {} unidentified",
            frame.index,
            frame.total(),
            fused.len(),
            unidentified
        );

        let faces = fused
            .into_iter()
            .zip(results)
            .map(|(detection, result)| IdentifiedFace { detection, result })
            .collect();

        Ok(FrameOutcome {
            index: frame.index,
            faces,
            report,
        })
    }

    /// Verdicts for the frames currently in the window.
    pub fn report(&self) -> AttendanceReport {
        self.aggregator.report(self.gallery.labels())
    }

    pub fn frames_in_window(&self) -> usize {
        self.aggregator.len()
    }

    /// Drops the window, e.g. when the operator restarts a roll call.
    pub fn reset(&mut self) {
        self.aggregator.clear();
        self.logger.info("Attendance window reset");
    }

    pub fn finish(&self) {
        self.logger.summary();
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::gallery::GalleryEntry;
    use crate::recognition::domain::match_result::MatchLabel;
    use crate::shared::bounding_box::BoundingBox;
    use rstest::rstest;
    use std::sync::Mutex;

    fn det(x: f64, confidence: f64, embedding: Vec<f32>) -> Detection {
        Detection::new(BoundingBox::new(x, 0.0, 80.0, 80.0), confidence, embedding)
    }

    fn gallery() -> Arc<Gallery> {
        Arc::new(
            Gallery::new(vec![
                GalleryEntry::new("alice", vec![vec![1.0, 0.0, 0.0]]),
                GalleryEntry::new("bob", vec![vec![0.0, 1.0, 0.0]]),
            ])
            .unwrap(),
        )
    }

    fn config(window_size: usize) -> EngineConfig {
        EngineConfig {
            window_size,
            presence_ratio: 0.6,
            similarity_threshold: 0.5,
            ..EngineConfig::default()
        }
    }

    fn use_case(window_size: usize) -> ProcessFrameUseCase {
        let logger = Box::new(NullPipelineLogger);
        ProcessFrameUseCase::from_config(&config(window_size), gallery(), logger).unwrap()
    }

    fn alice_and_bob(index: usize) -> FrameDetections {
        FrameDetections::new(
            index,
            vec![vec![det(0.0, 0.9, vec![1.0, 0.0, 0.0]), det(300.0, 0.9, vec![0.0, 1.0, 0.0])]],
        )
    }

    fn alice_only(index: usize) -> FrameDetections {
        FrameDetections::new(index, vec![vec![det(0.0, 0.9, vec![1.0, 0.0, 0.0])]])
    }

    #[test]
    fn test_single_frame_identifies_faces() {
        let mut uc = use_case(5);
        let outcome = uc.execute(&alice_and_bob(0)).unwrap();
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.known_count(), 2);
        assert_eq!(outcome.faces[0].result.label, MatchLabel::Known("alice".into()));
        assert!(outcome.report.is_none());
    }

    #[test]
    fn test_duplicate_passes_fused_before_matching() {
        let mut uc = use_case(5);
        let broad = vec![det(0.0, 0.6, vec![1.0, 0.0, 0.0])];
        let refined = vec![det(4.0, 0.95, vec![1.0, 0.0, 0.0])];
        let outcome = uc.execute(&FrameDetections::new(0, vec![broad, refined])).unwrap();
        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.faces[0].detection.confidence, 0.95);
    }

    #[test]
    fn test_weak_detections_filtered() {
        let mut uc = use_case(5);
        let frame = FrameDetections::new(0, vec![vec![det(0.0, 0.2, vec![1.0, 0.0, 0.0])]]);
        assert!(uc.execute(&frame).unwrap().faces.is_empty());
    }

    #[test]
    fn test_below_threshold_reported_unmatched() {
        let mut uc = use_case(5);
        // cos = 0.3 against alice, below the 0.5 threshold
        let frame = FrameDetections::new(0, vec![vec![det(0.0, 0.9, vec![0.3, 0.0, 0.954])]]);
        let outcome = uc.execute(&frame).unwrap();
        assert_eq!(outcome.faces[0].result, MatchResult::unmatched());
    }

    #[test]
    fn test_report_emitted_when_window_full() {
        let mut uc = use_case(5);
        for i in 0..4 {
            let frame = if i == 2 { alice_only(i) } else { alice_and_bob(i) };
            assert!(uc.execute(&frame).unwrap().report.is_none());
        }
        let report = uc.execute(&alice_only(4)).unwrap().report.unwrap();
        assert_eq!(report.window_frame_count, 5);
        assert!(report.verdict("alice").unwrap().present);
        // bob seen in 3/5 frames
        assert!(report.verdict("bob").unwrap().present);

        let report = uc.execute(&alice_only(5)).unwrap().report.unwrap();
        // bob now 2/5
        assert!(!report.verdict("bob").unwrap().present);
    }

    #[test]
    fn test_dimension_mismatch_leaves_window_untouched() {
        let mut uc = use_case(5);
        let frame = FrameDetections::new(0, vec![vec![det(0.0, 0.9, vec![1.0, 0.0])]]);
        let err = uc.execute(&frame).unwrap_err();
        assert!(matches!(err, EngineError::Match(MatchError::DimensionMismatch { .. })));
        assert_eq!(uc.frames_in_window(), 0);
    }

    #[test]
    fn test_excluded_labels_not_assigned() {
        let mut uc = use_case(5);
        let excluded = HashSet::from(["alice".to_string()]);
        let outcome = uc.execute_excluding(&alice_only(0), &excluded).unwrap();
        assert_eq!(outcome.known_count(), 0);
    }

    #[test]
    fn test_replace_gallery_applies_to_next_frame() {
        let mut uc = use_case(5);
        uc.execute(&alice_only(0)).unwrap();

        let carol = GalleryEntry::new("carol", vec![vec![1.0, 0.0, 0.0]]);
        let renamed = Gallery::new(vec![carol]).unwrap();
        uc.replace_gallery(Arc::new(renamed));
        let outcome = uc.execute(&alice_only(1)).unwrap();
        assert_eq!(outcome.faces[0].result.label.as_known(), Some("carol"));

        // alice stays in the report while her frames are in the window
        let labels: Vec<String> = uc.report().verdicts.into_iter().map(|v| v.label).collect();
        assert_eq!(labels, vec!["carol".to_string(), "alice".to_string()]);
    }

    #[test]
    fn test_empty_gallery_never_errors() {
        let mut uc = ProcessFrameUseCase::from_config(
            &config(2),
            Arc::new(Gallery::empty()),
            Box::new(NullPipelineLogger),
        )
        .unwrap();
        let outcome = uc.execute(&alice_and_bob(0)).unwrap();
        assert_eq!(outcome.faces.len(), 2);
        assert_eq!(outcome.known_count(), 0);
        let report = uc.execute(&alice_and_bob(1)).unwrap().report.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.unidentified_events, 4);
    }

    #[test]
    fn test_reset_clears_window() {
        let mut uc = use_case(5);
        uc.execute(&alice_only(0)).unwrap();
        uc.reset();
        assert_eq!(uc.frames_in_window(), 0);
        assert!(uc.report().is_empty());
    }

    #[rstest]
    #[case::greedy(AssignmentStrategy::Greedy, "greedy")]
    #[case::optimal(AssignmentStrategy::Optimal, "optimal")]
    fn test_matcher_follows_strategy(#[case] strategy: AssignmentStrategy, #[case] name: &str) {
        let config = EngineConfig {
            strategy,
            ..EngineConfig::default()
        };
        let uc = ProcessFrameUseCase::from_config(&config, gallery(), Box::new(NullPipelineLogger))
            .unwrap();
        assert_eq!(uc.matcher_name(), name);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = EngineConfig {
            window_size: 0,
            ..EngineConfig::default()
        };
        let logger = Box::new(NullPipelineLogger);
        let result = ProcessFrameUseCase::from_config(&bad, gallery(), logger);
        assert!(matches!(result, Err(EngineError::Config(ConfigError::Invalid(_)))));
    }

    struct RecordingLogger {
        stages: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn frame_done(&mut self, _index: usize) {}
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.stages.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, _name: &str, _value: f64) {}
        fn info(&mut self, _message: &str) {}
    }

    #[test]
    fn test_stages_timed_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let logger = RecordingLogger {
            stages: stages.clone(),
        };
        let mut uc =
            ProcessFrameUseCase::from_config(&config(3), gallery(), Box::new(logger)).unwrap();
        uc.execute(&alice_only(0)).unwrap();
        assert_eq!(*stages.lock().unwrap(), vec!["fuse", "match", "aggregate"]);
    }
}
