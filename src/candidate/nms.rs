//! Greedy non-maximum suppression over pixel boxes.

use crate::geometry::PixelRect;
use crate::trace::{trace_event, trace_span};
use crate::util::{DecodeError, DecodeResult};

/// Greedy NMS policy.
///
/// Candidates are visited by descending score (ties by ascending index) and a
/// candidate is kept unless a previously kept box of the same class overlaps it
/// with IoU at or above `iou_threshold`. With `class_agnostic` every kept box
/// suppresses regardless of class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Suppressor {
    /// Overlap at which a lower-scored box is discarded.
    pub iou_threshold: f32,
    /// Scores at or below this value are ignored.
    pub score_threshold: f32,
    /// Suppress across classes instead of per class.
    pub class_agnostic: bool,
    /// Stop after this many kept boxes.
    pub max_detections: Option<usize>,
}

impl Default for Suppressor {
    fn default() -> Self {
        Self {
            iou_threshold: 0.45,
            score_threshold: 0.25,
            class_agnostic: false,
            max_detections: None,
        }
    }
}

impl Suppressor {
    /// Returns the indices of the kept boxes, highest score first.
    ///
    /// `boxes`, `scores` and `class_ids` are parallel slices.
    pub fn suppress(
        &self,
        boxes: &[PixelRect],
        scores: &[f32],
        class_ids: &[usize],
    ) -> DecodeResult<Vec<usize>> {
        if boxes.len() != scores.len() || boxes.len() != class_ids.len() {
            return Err(DecodeError::InvalidInput(
                "boxes, scores and class ids must have equal length",
            ));
        }
        let _span = trace_span!("suppress", candidates = boxes.len()).entered();

        let mut order: Vec<usize> = (0..boxes.len())
            .filter(|&idx| scores[idx] > self.score_threshold)
            .collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));

        let limit = self.max_detections.unwrap_or(usize::MAX);
        let mut kept: Vec<usize> = Vec::new();

        'outer: for idx in order {
            if kept.len() >= limit {
                break;
            }
            for &kept_idx in kept.iter() {
                let same_group = self.class_agnostic || class_ids[kept_idx] == class_ids[idx];
                if same_group && boxes[kept_idx].iou(&boxes[idx]) >= self.iou_threshold {
                    continue 'outer;
                }
            }
            kept.push(idx);
        }

        trace_event!("kept", count = kept.len());
        Ok(kept)
    }
}
