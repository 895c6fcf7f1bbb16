//! Decoder for rows carrying an objectness field ahead of the class scores.

use crate::candidate::Candidate;
use crate::decode::{decode_rows, CandidateDecoder, DecodeParams, ObjectnessMode};
use crate::tensor::{RowView, TensorView};
use crate::util::math::argmax;
use crate::util::DecodeResult;

const OBJECTNESS_FIELD: usize = 4;

/// Score-inline layout: geometry, objectness, then class scores.
pub struct ScoreInline;

impl CandidateDecoder for ScoreInline {
    const LEADING_FIELDS: usize = 5;

    fn score_row(row: RowView<'_>, params: &DecodeParams) -> Option<(usize, f32)> {
        let scores = row.slice(Self::LEADING_FIELDS, params.num_classes)?;
        let (class_id, score) = argmax(scores.iter())?;
        match params.objectness {
            ObjectnessMode::Ignore => Some((class_id, score)),
            ObjectnessMode::Multiply => {
                let objectness = row.get(OBJECTNESS_FIELD)?;
                Some((class_id, objectness * score))
            }
        }
    }

    fn decode(
        view: TensorView<'_>,
        masks: Option<TensorView<'_>>,
        params: &DecodeParams,
    ) -> DecodeResult<Vec<Candidate>> {
        decode_rows(view, masks, params, Self::LEADING_FIELDS, Self::score_row)
    }
}
