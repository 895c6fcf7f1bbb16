//! Model-space to pixel-space box mapping.
//!
//! The factors mirror the preprocessing that fed the network. With a direct
//! resize each axis scales by `frame / input`. With letterboxing the frame was
//! pasted at the top-left of a zero-filled square canvas of side
//! `max(frame_w, frame_h)` before resizing, so both axes scale by
//! `side / input` and no offset is subtracted. Letterboxing only applies to
//! square inputs; a non-square input always reads as a direct resize.

use crate::geometry::{FrameSize, InputSize, ModelBox, PixelRect};
use crate::util::{DecodeError, DecodeResult};

/// Maps model-space boxes onto one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxRescaler {
    x_factor: f32,
    y_factor: f32,
    frame: FrameSize,
}

impl BoxRescaler {
    /// Computes the scale factors for a frame.
    ///
    /// `letterbox` is ignored when `input` is not square.
    pub fn new(input: InputSize, frame: FrameSize, letterbox: bool) -> DecodeResult<Self> {
        if input.width == 0 || input.height == 0 {
            return Err(DecodeError::InvalidInput("input size must be non-zero"));
        }
        if frame.width == 0 || frame.height == 0 {
            return Err(DecodeError::InvalidInput("frame size must be non-zero"));
        }
        let (canvas_w, canvas_h) = if letterbox && input.is_square() {
            let side = frame.width.max(frame.height);
            (side, side)
        } else {
            (frame.width, frame.height)
        };
        Ok(Self {
            x_factor: canvas_w as f32 / input.width as f32,
            y_factor: canvas_h as f32 / input.height as f32,
            frame,
        })
    }

    /// Horizontal scale factor.
    pub fn x_factor(&self) -> f32 {
        self.x_factor
    }

    /// Vertical scale factor.
    pub fn y_factor(&self) -> f32 {
        self.y_factor
    }

    /// Frame the rescaler targets.
    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    /// Maps a box to an unclipped pixel rect (values truncated toward zero).
    pub fn to_pixels(&self, bbox: &ModelBox) -> PixelRect {
        let (left, top) = bbox.left_top();
        PixelRect::new(
            (left * self.x_factor) as i32,
            (top * self.y_factor) as i32,
            (bbox.w * self.x_factor) as i32,
            (bbox.h * self.y_factor) as i32,
        )
    }

    /// Maps a box and clips it to the frame.
    ///
    /// Returns the unclipped rect alongside the clipped one, or `None` for a
    /// degenerate box.
    pub fn to_clipped_pixels(&self, bbox: &ModelBox) -> Option<(PixelRect, PixelRect)> {
        let raw = self.to_pixels(bbox);
        raw.clip_to(self.frame).map(|clipped| (raw, clipped))
    }
}
