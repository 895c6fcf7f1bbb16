//! Decoder for `[cx, cy, w, h, class scores.., mask coeffs..]` rows.

use crate::candidate::Candidate;
use crate::decode::{decode_rows, CandidateDecoder, DecodeParams};
use crate::tensor::{RowView, TensorView};
use crate::util::math::argmax;
use crate::util::DecodeResult;

/// Box-first layout: four geometry fields, then class scores.
pub struct BoxFirst;

impl CandidateDecoder for BoxFirst {
    const LEADING_FIELDS: usize = 4;

    fn score_row(row: RowView<'_>, params: &DecodeParams) -> Option<(usize, f32)> {
        let scores = row.slice(Self::LEADING_FIELDS, params.num_classes)?;
        argmax(scores.iter())
    }

    fn decode(
        view: TensorView<'_>,
        masks: Option<TensorView<'_>>,
        params: &DecodeParams,
    ) -> DecodeResult<Vec<Candidate>> {
        decode_rows(view, masks, params, Self::LEADING_FIELDS, Self::score_row)
    }
}
