//! Low-level building blocks for custom decode pipelines.
//!
//! These expose the individual stages behind [`Pipeline`](crate::Pipeline) for
//! callers that need to reorder or replace one of them. Most users should
//! prefer the top-level `Pipeline` API.

pub use crate::candidate::nms::Suppressor;
pub use crate::decode::{BoxFirst, CandidateDecoder, DecodeParams, ScoreInline};
pub use crate::geometry::BoxRescaler;
pub use crate::mask::resample::{normalize_to_u8, resize_bilinear, sample_bilinear, SampleWindow};
pub use crate::mask::{MaskProjector, MaskSource, Prototypes};
pub use crate::tensor::RowView;
