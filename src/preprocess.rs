//! Frame preparation that matches [`BoxRescaler`](crate::geometry::BoxRescaler).
//!
//! The model runner is outside this crate, but the rescaler's factors are only
//! correct if the network saw the frame prepared the same way: optionally
//! pasted at the top-left of a zero-filled square canvas, then bilinearly
//! resized to the input resolution and scaled to `[0, 1]` in NCHW order.

use crate::geometry::InputSize;
use crate::mask::resample::resize_bilinear;
use crate::util::{DecodeError, DecodeResult};

const CHANNELS: usize = 3;

/// Options for [`blob_from_rgb`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobOptions {
    /// Network input resolution.
    pub input_size: InputSize,
    /// Pad to a top-left anchored square first (square inputs only).
    pub letterbox: bool,
    /// Reverse the channel order (BGR <-> RGB).
    pub swap_rb: bool,
}

impl Default for BlobOptions {
    fn default() -> Self {
        Self {
            input_size: InputSize::square(640),
            letterbox: true,
            swap_rb: false,
        }
    }
}

fn check_frame(pixels: &[u8], width: usize, height: usize) -> DecodeResult<usize> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidInput("frame size must be non-zero"));
    }
    let needed = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or(DecodeError::InvalidInput("frame dimensions overflow"))?;
    if pixels.len() < needed {
        return Err(DecodeError::BufferTooSmall {
            needed,
            got: pixels.len(),
        });
    }
    Ok(needed)
}

/// Pastes an interleaved 3-channel frame onto a zero square canvas.
///
/// Returns the canvas and its side, `max(width, height)`.
pub fn letterbox_square(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> DecodeResult<(Vec<u8>, usize)> {
    check_frame(pixels, width, height)?;
    let side = width.max(height);
    let mut canvas = vec![0u8; side * side * CHANNELS];
    let row_len = width * CHANNELS;
    for y in 0..height {
        let src = &pixels[y * row_len..(y + 1) * row_len];
        let dst_start = y * side * CHANNELS;
        canvas[dst_start..dst_start + row_len].copy_from_slice(src);
    }
    Ok((canvas, side))
}

/// Builds a `1 x 3 x H x W` input blob from an interleaved 3-channel frame.
pub fn blob_from_rgb(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: BlobOptions,
) -> DecodeResult<Vec<f32>> {
    check_frame(pixels, width, height)?;
    let InputSize {
        width: dst_w,
        height: dst_h,
    } = options.input_size;
    if dst_w == 0 || dst_h == 0 {
        return Err(DecodeError::InvalidInput("input size must be non-zero"));
    }

    let padded;
    let (src, src_w, src_h) = if options.letterbox && options.input_size.is_square() {
        let (canvas, side) = letterbox_square(pixels, width, height)?;
        padded = canvas;
        (padded.as_slice(), side, side)
    } else {
        (pixels, width, height)
    };

    let plane_len = src_w * src_h;
    let mut blob = Vec::with_capacity(CHANNELS * dst_w * dst_h);
    for c in 0..CHANNELS {
        let channel = if options.swap_rb { CHANNELS - 1 - c } else { c };
        let plane: Vec<f32> = (0..plane_len)
            .map(|i| f32::from(src[i * CHANNELS + channel]) / 255.0)
            .collect();
        blob.extend(resize_bilinear(&plane, src_w, src_h, dst_w, dst_h));
    }
    Ok(blob)
}
