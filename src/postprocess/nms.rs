//! Non-maximum suppression.

use crate::detect::result::BBox;

/// Remove candidates that are redundant with a higher-confidence box.
///
/// Greedy algorithm: sort by confidence descending (stable, so equal
/// confidences keep input order and first-seen wins), then walk the sorted
/// list keeping each unsuppressed box and suppressing every later box whose
/// IoU with it exceeds `overlap_threshold`. The returned list is in
/// confidence-descending order.
///
/// A threshold of 0 suppresses any pair with positive overlap; a threshold
/// of 1 suppresses only exact duplicates (IoU = 1). Degenerate boxes have
/// IoU 0 against everything and can never suppress a neighbor.
///
/// O(n^2) in the candidate count, which stays small per frame once the
/// confidence filter has run.
pub fn suppress(candidates: Vec<BBox>, overlap_threshold: f32) -> Vec<BBox> {
    if candidates.len() <= 1 {
        return candidates;
    }

    let mut sorted = candidates;
    // Stable sort: ties keep input order, giving deterministic output.
    sorted.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; sorted.len()];
    let mut kept = Vec::new();

    for i in 0..sorted.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(sorted[i]);
        for j in (i + 1)..sorted.len() {
            if suppressed[j] {
                continue;
            }
            if is_redundant(sorted[i].iou(&sorted[j]), overlap_threshold) {
                suppressed[j] = true;
            }
        }
    }

    kept
}

/// Redundancy test. Strictly-greater comparison, except at threshold 1.0
/// where exact duplicates (IoU = 1) are still suppressed.
fn is_redundant(iou: f32, overlap_threshold: f32) -> bool {
    if overlap_threshold >= 1.0 {
        iou >= 1.0
    } else {
        iou > overlap_threshold
    }
}
