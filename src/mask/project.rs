//! Mask reconstruction for individual detections.

use crate::candidate::Candidate;
use crate::geometry::{InputSize, PixelRect};
use crate::mask::resample::{normalize_to_u8, sample_bilinear, SampleWindow};
use crate::mask::{Mask, MaskConfig, MaskSource};
use crate::util::{DecodeError, DecodeResult};

/// Builds binary masks for kept detections.
///
/// The field is laid over the unclipped pixel box and only the part inside the
/// clipped box is sampled, so a box hanging off the frame keeps its geometry
/// and the mask matches the clipped box size exactly.
#[derive(Clone, Copy, Debug)]
pub struct MaskProjector<'a> {
    source: MaskSource<'a>,
    config: MaskConfig,
    input: InputSize,
}

impl<'a> MaskProjector<'a> {
    /// Creates a projector for one frame.
    pub fn new(source: MaskSource<'a>, config: MaskConfig, input: InputSize) -> Self {
        Self {
            source,
            config,
            input,
        }
    }

    /// Mask source in use.
    pub fn source(&self) -> MaskSource<'a> {
        self.source
    }

    /// Normalized 8-bit field for a candidate, with its width and height.
    pub fn field(&self, coeffs: &[f32]) -> DecodeResult<(Vec<u8>, usize, usize)> {
        match self.source {
            MaskSource::Coefficients(protos) => {
                let combined = protos.combine(coeffs)?;
                let field = normalize_to_u8(&combined, self.config.activation);
                Ok((field, protos.width(), protos.height()))
            }
            MaskSource::Inline { side } => {
                if coeffs.len() != side * side {
                    return Err(DecodeError::ShapeMismatch {
                        shape: vec![coeffs.len()],
                        reason: "inline mask field has the wrong size",
                    });
                }
                Ok((normalize_to_u8(coeffs, self.config.activation), side, side))
            }
        }
    }

    /// Projects the candidate's mask onto its box.
    ///
    /// `raw` is the unclipped pixel box and `clipped` its frame-clipped part.
    /// Zero-area boxes yield `None`.
    pub fn project(
        &self,
        candidate: &Candidate,
        raw: PixelRect,
        clipped: PixelRect,
    ) -> DecodeResult<Option<Mask>> {
        if raw.area() == 0 || clipped.area() == 0 {
            return Ok(None);
        }
        let (field, field_w, field_h) = self.field(&candidate.mask_coeffs)?;
        let window = self.window(candidate, field_w, field_h);

        let raw_w = raw.width as usize;
        let raw_h = raw.height as usize;
        let out_w = clipped.width as usize;
        let out_h = clipped.height as usize;
        let off_x = (clipped.x - raw.x).max(0) as usize;
        let off_y = (clipped.y - raw.y).max(0) as usize;
        let cutoff = self.config.threshold * 255.0;

        let mut data = Vec::with_capacity(out_w * out_h);
        for y in 0..out_h {
            for x in 0..out_w {
                let (sx, sy) = window.source_coord(off_x + x, off_y + y, raw_w, raw_h);
                let value = sample_bilinear(&field, field_w, field_h, sx, sy);
                data.push(if value > cutoff { 255 } else { 0 });
            }
        }
        Mask::new(data, out_w, out_h).map(Some)
    }

    fn window(&self, candidate: &Candidate, field_w: usize, field_h: usize) -> SampleWindow {
        let full = SampleWindow::full(field_w, field_h);
        if !self.config.crop_to_box || !matches!(self.source, MaskSource::Coefficients(_)) {
            return full;
        }
        let sx = field_w as f32 / self.input.width as f32;
        let sy = field_h as f32 / self.input.height as f32;
        let (left, top) = candidate.bbox.left_top();
        let window = SampleWindow {
            x0: left * sx,
            y0: top * sy,
            width: candidate.bbox.w * sx,
            height: candidate.bbox.h * sy,
        };
        if window.width > 0.0 && window.height > 0.0 {
            window
        } else {
            full
        }
    }
}
