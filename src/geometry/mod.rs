//! Box types in model space and pixel space.
//!
//! Model-space boxes are centre based and measured in network input units.
//! Pixel rects are top-left based integer rectangles in the source frame, with
//! `x + width` and `y + height` exclusive.

pub mod rescale;

pub use rescale::BoxRescaler;

/// Square-or-not network input resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSize {
    pub width: usize,
    pub height: usize,
}

impl InputSize {
    /// Creates an input size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Square input of side `side`.
    pub fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    /// Returns true when width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Source frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl FrameSize {
    /// Creates a frame size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Centre-based box in model input coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl ModelBox {
    /// Creates a box from centre and size.
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Top-left corner.
    pub fn left_top(&self) -> (f32, f32) {
        (self.cx - 0.5 * self.w, self.cy - 0.5 * self.h)
    }
}

/// Integer pixel rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Creates a rect from its top-left corner and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area, zero for empty or inverted rects.
    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        i64::from(self.width) * i64::from(self.height)
    }

    /// Area of the overlap with `other`.
    pub fn intersection_area(&self, other: &PixelRect) -> i64 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return 0;
        }
        i64::from(x1 - x0) * i64::from(y1 - y0)
    }

    /// Intersection over union; 0 when the union is empty.
    pub fn iou(&self, other: &PixelRect) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }

    /// Clips to `[0, width) x [0, height)` of the frame.
    ///
    /// Returns `None` when nothing of positive area remains.
    pub fn clip_to(&self, frame: FrameSize) -> Option<PixelRect> {
        let frame_w = i32::try_from(frame.width).unwrap_or(i32::MAX);
        let frame_h = i32::try_from(frame.height).unwrap_or(i32::MAX);
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(frame_w);
        let y1 = self.bottom().min(frame_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
    }
}
