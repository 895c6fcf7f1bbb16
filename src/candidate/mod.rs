//! Decoded candidates and duplicate suppression.

pub(crate) mod nms;

use crate::geometry::ModelBox;

/// One detection row that cleared the score floor.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Row index in the detection tensor.
    pub row: usize,
    /// Index of the best-scoring class.
    pub class_id: usize,
    /// Score of that class.
    pub score: f32,
    /// Box in model input coordinates.
    pub bbox: ModelBox,
    /// Mask coefficients or inline mask field; empty when the model has none.
    pub mask_coeffs: Vec<f32>,
}
