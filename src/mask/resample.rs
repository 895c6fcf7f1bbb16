//! Field normalization and bilinear resampling.
//!
//! Sampling uses half-pixel centres: destination pixel `d` of a `dst`-wide
//! grid reads source coordinate `x0 + (d + 0.5) * (w / dst) - 0.5` for a
//! source window `[x0, x0 + w)`. Coordinates are clamped to the field, so
//! edges replicate.

use crate::mask::MaskActivation;
use crate::util::math::sigmoid;

/// Source region in field coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleWindow {
    pub x0: f32,
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl SampleWindow {
    /// The whole `width x height` field.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Source coordinate for destination pixel `(dx, dy)` of a `dst_w x dst_h`
    /// grid laid over the window.
    #[inline]
    pub fn source_coord(&self, dx: usize, dy: usize, dst_w: usize, dst_h: usize) -> (f32, f32) {
        let sx = self.x0 + (dx as f32 + 0.5) * (self.width / dst_w as f32) - 0.5;
        let sy = self.y0 + (dy as f32 + 0.5) * (self.height / dst_h as f32) - 0.5;
        (sx, sy)
    }
}

/// Maps a raw field to 8-bit intensities.
pub fn normalize_to_u8(field: &[f32], activation: MaskActivation) -> Vec<u8> {
    match activation {
        MaskActivation::MinMax => {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &value in field.iter().filter(|v| v.is_finite()) {
                min = min.min(value);
                max = max.max(value);
            }
            let range = max - min;
            if !range.is_finite() || range <= f32::EPSILON {
                return vec![0u8; field.len()];
            }
            let scale = 255.0 / range;
            field
                .iter()
                .map(|&value| {
                    if value.is_finite() {
                        ((value - min) * scale).round().clamp(0.0, 255.0) as u8
                    } else {
                        0
                    }
                })
                .collect()
        }
        MaskActivation::Sigmoid => field
            .iter()
            .map(|&value| (sigmoid(value) * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect(),
    }
}

/// Bilinear sample at `(sx, sy)` with clamped coordinates.
///
/// `src` must hold at least `width * height` values and both dimensions must
/// be non-zero.
pub fn sample_bilinear<T>(src: &[T], width: usize, height: usize, sx: f32, sy: f32) -> f32
where
    T: Copy + Into<f32>,
{
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;
    let sx = if sx.is_finite() { sx.clamp(0.0, max_x) } else { 0.0 };
    let sy = if sy.is_finite() { sy.clamp(0.0, max_y) } else { 0.0 };
    let x0 = sx.floor() as usize;
    let y0 = sy.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let a: f32 = src[y0 * width + x0].into();
    let b: f32 = src[y0 * width + x1].into();
    let c: f32 = src[y1 * width + x0].into();
    let d: f32 = src[y1 * width + x1].into();

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;
    a * w00 + b * w10 + c * w01 + d * w11
}

/// Resizes a single-channel field to `dst_w x dst_h`.
pub fn resize_bilinear<T>(
    src: &[T],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f32>
where
    T: Copy + Into<f32>,
{
    let mut out = Vec::with_capacity(dst_w * dst_h);
    if src_w == 0 || src_h == 0 || src.len() < src_w * src_h {
        out.resize(dst_w * dst_h, 0.0);
        return out;
    }
    let window = SampleWindow::full(src_w, src_h);
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let (sx, sy) = window.source_coord(dx, dy, dst_w, dst_h);
            out.push(sample_bilinear(src, src_w, src_h, sx, sy));
        }
    }
    out
}
