//! Per-row candidate extraction for the supported export layouts.
//!
//! Each layout has its own decoder behind [`CandidateDecoder`]; [`Layout`] is
//! the configuration-time tag that dispatches to one of them. Decoders only
//! read fields inside the view's declared shape and never emit a candidate
//! whose score is at or below the floor.

pub(crate) mod box_first;
pub(crate) mod score_inline;

pub use box_first::BoxFirst;
pub use score_inline::ScoreInline;

use crate::candidate::Candidate;
use crate::geometry::ModelBox;
use crate::tensor::{RowView, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::{DecodeError, DecodeResult};

/// Tensor layout of one model export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// `[cx, cy, w, h, scores.., coeffs..]`.
    #[default]
    BoxFirst,
    /// `[cx, cy, w, h, objectness, scores.., coeffs..]`, usually paired with a
    /// dedicated row-aligned mask tensor.
    ScoreInline,
}

impl Layout {
    /// Fields ahead of the class scores.
    pub fn leading_fields(&self) -> usize {
        match self {
            Layout::BoxFirst => BoxFirst::LEADING_FIELDS,
            Layout::ScoreInline => ScoreInline::LEADING_FIELDS,
        }
    }

    /// Smallest row width that can hold `num_classes` scores.
    pub fn min_fields(&self, num_classes: usize) -> usize {
        self.leading_fields() + num_classes
    }

    /// Runs the decoder for this layout.
    pub fn decode(
        &self,
        view: TensorView<'_>,
        masks: Option<TensorView<'_>>,
        params: &DecodeParams,
    ) -> DecodeResult<Vec<Candidate>> {
        match self {
            Layout::BoxFirst => <BoxFirst as CandidateDecoder>::decode(view, masks, params),
            Layout::ScoreInline => <ScoreInline as CandidateDecoder>::decode(view, masks, params),
        }
    }
}

/// How the objectness field of score-inline rows affects the score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObjectnessMode {
    /// Score is the best class score alone.
    #[default]
    Ignore,
    /// Score is objectness times the best class score.
    Multiply,
}

/// Decoder parameters shared by every layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    /// Number of class score fields per row.
    pub num_classes: usize,
    /// Candidates need a score strictly above this.
    pub score_threshold: f32,
    /// Objectness handling (score-inline only).
    pub objectness: ObjectnessMode,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            num_classes: 80,
            score_threshold: 0.25,
            objectness: ObjectnessMode::Ignore,
        }
    }
}

/// Decoder for one tensor layout.
pub trait CandidateDecoder {
    /// Fields ahead of the class scores.
    const LEADING_FIELDS: usize;

    /// Best `(class_id, score)` of a row, or `None` if the row has no finite
    /// score.
    fn score_row(row: RowView<'_>, params: &DecodeParams) -> Option<(usize, f32)>;

    /// Extracts every candidate above the score floor.
    ///
    /// Mask coefficients come from `masks` (row `r` for detection row `r`)
    /// when given, otherwise from the fields trailing the class scores.
    fn decode(
        view: TensorView<'_>,
        masks: Option<TensorView<'_>>,
        params: &DecodeParams,
    ) -> DecodeResult<Vec<Candidate>>;
}

/// Row walk shared by the decoders.
pub(crate) fn decode_rows<F>(
    view: TensorView<'_>,
    masks: Option<TensorView<'_>>,
    params: &DecodeParams,
    leading: usize,
    score_row: F,
) -> DecodeResult<Vec<Candidate>>
where
    F: Fn(RowView<'_>, &DecodeParams) -> Option<(usize, f32)>,
{
    if params.num_classes == 0 {
        return Err(DecodeError::InvalidInput("num_classes must be at least 1"));
    }
    let score_end = leading + params.num_classes;
    if view.fields() < score_end {
        return Err(DecodeError::ShapeMismatch {
            shape: vec![view.rows(), view.fields()],
            reason: "fewer fields than the layout requires",
        });
    }
    if let Some(masks) = masks {
        if masks.rows() != view.rows() {
            return Err(DecodeError::ShapeMismatch {
                shape: vec![masks.rows(), masks.fields()],
                reason: "mask tensor rows do not align with detections",
            });
        }
    }

    let _span = trace_span!("decode", rows = view.rows(), fields = view.fields()).entered();
    let trailing = view.fields() - score_end;
    let mut out = Vec::new();

    for r in 0..view.rows() {
        let Some(row) = view.row(r) else {
            continue;
        };
        let Some((class_id, score)) = score_row(row, params) else {
            continue;
        };
        if !(score > params.score_threshold) {
            continue;
        }

        let bbox = match (row.get(0), row.get(1), row.get(2), row.get(3)) {
            (Some(cx), Some(cy), Some(w), Some(h)) => ModelBox::new(cx, cy, w, h),
            _ => continue,
        };
        let mask_coeffs = match masks {
            Some(masks) => masks.row(r).map(|m| m.to_vec()).unwrap_or_default(),
            None if trailing > 0 => row
                .slice(score_end, trailing)
                .map(|m| m.to_vec())
                .unwrap_or_default(),
            None => Vec::new(),
        };

        out.push(Candidate {
            row: r,
            class_id,
            score,
            bbox,
            mask_coeffs,
        });
    }

    trace_event!("candidates", count = out.len());
    Ok(out)
}
