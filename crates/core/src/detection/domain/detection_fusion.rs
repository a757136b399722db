use crate::detection::domain::detection::{Detection, DetectionOrigin};
use crate::shared::constants::{DEFAULT_FUSION_IOU_THRESHOLD, MERGE_IOU_THRESHOLD};

/// Merges several detection passes over one frame into a duplicate-free set.
///
/// Passes are folded in call order (later passes are refinements), then
/// operator-triggered manual detections are folded in last. Overlap during
/// the fold uses the fixed [`MERGE_IOU_THRESHOLD`]; the final deduplication
/// pass uses the configurable `iou_threshold`.
pub struct DetectionFusion {
    iou_threshold: f64,
}

impl DetectionFusion {
    pub fn new(iou_threshold: f64) -> Self {
        Self { iou_threshold }
    }

    pub fn fuse(&self, passes: &[Vec<Detection>], manual: &[Detection]) -> Vec<Detection> {
        let mut merged: Vec<Detection> = match passes.split_first() {
            Some((first, rest)) => {
                let mut acc = first.clone();
                for pass in rest {
                    merge_pass(&mut acc, pass);
                }
                acc
            }
            None => Vec::new(),
        };
        merge_pass(&mut merged, manual);

        let raw = passes.iter().map(Vec::len).sum::<usize>() + manual.len();
        let fused = deduplicate(&merged, self.iou_threshold);
        log::debug!(
            "Fused {} passes + {} manual: {raw} → {} detections",
            passes.len(),
            manual.len(),
            fused.len()
        );
        fused
    }
}

impl Default for DetectionFusion {
    fn default() -> Self {
        Self::new(DEFAULT_FUSION_IOU_THRESHOLD)
    }
}

/// Greedy deduplication in input order.
///
/// Each detection is compared with the ones accepted so far; on overlap above
/// `iou_threshold` the stronger of the two keeps the slot.
pub fn deduplicate(detections: &[Detection], iou_threshold: f64) -> Vec<Detection> {
    if detections.len() <= 1 {
        return detections.to_vec();
    }
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for d in detections {
        absorb(&mut kept, d, iou_threshold);
    }
    kept
}

fn merge_pass(acc: &mut Vec<Detection>, pass: &[Detection]) {
    for candidate in pass {
        absorb(acc, candidate, MERGE_IOU_THRESHOLD);
    }
}

/// Folds one candidate into `acc`, which never holds a conflicting pair.
///
/// A candidate that conflicts with nothing is appended. One that prevails
/// over every detection it conflicts with evicts them all and takes the slot
/// of the first; otherwise it is dropped.
fn absorb(acc: &mut Vec<Detection>, candidate: &Detection, iou_threshold: f64) {
    let rivals: Vec<usize> = acc
        .iter()
        .enumerate()
        .filter(|(_, existing)| conflicts(existing, candidate, iou_threshold))
        .map(|(idx, _)| idx)
        .collect();

    let Some(&first) = rivals.first() else {
        acc.push(candidate.clone());
        return;
    };
    if !rivals.iter().all(|&idx| prevails(candidate, &acc[idx])) {
        return;
    }

    acc[first] = candidate.clone();
    for &idx in rivals[1..].iter().rev() {
        acc.remove(idx);
    }
}

/// Two manual detections never conflict.
fn conflicts(a: &Detection, b: &Detection, iou_threshold: f64) -> bool {
    !(a.is_manual() && b.is_manual()) && a.iou(b) > iou_threshold
}

fn prevails(candidate: &Detection, existing: &Detection) -> bool {
    match (candidate.origin, existing.origin) {
        (DetectionOrigin::Manual, DetectionOrigin::Automatic) => true,
        (DetectionOrigin::Automatic, DetectionOrigin::Manual) => false,
        _ => candidate.confidence > existing.confidence,
    }
}
