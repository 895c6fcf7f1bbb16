//! Shape-aware views over raw network output buffers.
//!
//! `RawTensor` pairs a borrowed `f32` buffer with its declared shape as handed
//! over by the model runner. `TensorView` is a validated 2D "rows x fields"
//! accessor on top of it: a detection tensor exported channel-major
//! (`1 x fields x rows`) is read through the same `row(r)` / `get(r, f)` API as
//! a detection-major one (`1 x rows x fields`) without materializing the
//! transpose. All bounds are checked when the view is built, so accessors never
//! read past the declared shape.

use crate::decode::Layout;
use crate::util::{DecodeError, DecodeResult};

/// Memory order of a 2D detection tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageOrder {
    /// Decide from the shape (see [`TensorView::from_tensor`]).
    #[default]
    Auto,
    /// `rows x fields`: each detection is contiguous.
    DetectionMajor,
    /// `fields x rows`: each attribute is contiguous.
    ChannelMajor,
}

/// Borrowed raw tensor as produced by the model runner.
#[derive(Clone, Copy, Debug)]
pub struct RawTensor<'a> {
    data: &'a [f32],
    shape: &'a [usize],
}

impl<'a> RawTensor<'a> {
    /// Wraps a buffer and its declared shape.
    ///
    /// The buffer may be longer than the shape requires; trailing elements are
    /// never read.
    pub fn new(data: &'a [f32], shape: &'a [usize]) -> DecodeResult<Self> {
        if shape.is_empty() {
            return Err(DecodeError::ShapeMismatch {
                shape: Vec::new(),
                reason: "tensor has rank 0",
            });
        }
        let needed = element_count(shape)?;
        if data.len() < needed {
            return Err(DecodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns the backing slice.
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the declared shape.
    pub fn shape(&self) -> &'a [usize] {
        self.shape
    }

    /// Returns the tensor rank.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Strips an optional leading batch axis and returns batch 0.
    ///
    /// Accepts tensors of rank `rank` or `rank + 1`.
    pub(crate) fn first_batch(&self, rank: usize) -> DecodeResult<(&'a [f32], &'a [usize])> {
        let dims = if self.shape.len() == rank {
            self.shape
        } else if self.shape.len() == rank + 1 {
            &self.shape[1..]
        } else {
            return Err(self.mismatch("unexpected tensor rank"));
        };
        let len = element_count(dims)?;
        if len == 0 {
            return Err(self.mismatch("tensor has an empty dimension"));
        }
        let data = self.data.get(..len).ok_or(DecodeError::BufferTooSmall {
            needed: len,
            got: self.data.len(),
        })?;
        Ok((data, dims))
    }

    pub(crate) fn mismatch(&self, reason: &'static str) -> DecodeError {
        DecodeError::ShapeMismatch {
            shape: self.shape.to_vec(),
            reason,
        }
    }
}

fn element_count(dims: &[usize]) -> DecodeResult<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| DecodeError::ShapeMismatch {
            shape: dims.to_vec(),
            reason: "element count overflows",
        })
}

/// The tensors of one inference call, by role.
#[derive(Clone, Copy, Debug)]
pub struct RawOutput<'a> {
    /// Per-row box/score tensor.
    pub detections: RawTensor<'a>,
    /// Row-aligned mask data: coefficients, or an inline field per row.
    pub masks: Option<RawTensor<'a>>,
    /// Shared mask prototypes, `[1, M, protoH, protoW]`.
    pub prototypes: Option<RawTensor<'a>>,
}

impl<'a> RawOutput<'a> {
    /// Output with only a detection tensor.
    pub fn new(detections: RawTensor<'a>) -> Self {
        Self {
            detections,
            masks: None,
            prototypes: None,
        }
    }

    /// Attaches a row-aligned mask tensor.
    pub fn with_masks(mut self, masks: RawTensor<'a>) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Attaches a prototype tensor.
    pub fn with_prototypes(mut self, prototypes: RawTensor<'a>) -> Self {
        self.prototypes = Some(prototypes);
        self
    }

    /// Assigns roles to the runner's tensors in output order.
    ///
    /// Box-first exports emit `[detections, prototypes?]`; score-inline exports
    /// emit `[detections, masks?, prototypes?]`.
    pub fn from_tensors(tensors: &[RawTensor<'a>], layout: Layout) -> DecodeResult<Self> {
        let (first, rest) = tensors
            .split_first()
            .ok_or(DecodeError::InvalidInput("no output tensors"))?;
        let output = Self::new(*first);
        match (layout, rest) {
            (_, []) => Ok(output),
            (Layout::BoxFirst, [protos]) => Ok(output.with_prototypes(*protos)),
            (Layout::ScoreInline, [masks]) => Ok(output.with_masks(*masks)),
            (Layout::ScoreInline, [masks, protos]) => {
                Ok(output.with_masks(*masks).with_prototypes(*protos))
            }
            _ => Err(DecodeError::InvalidInput(
                "unexpected number of output tensors for layout",
            )),
        }
    }
}

/// Bounds-checked "rows x fields" view over a detection tensor.
#[derive(Clone, Copy, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    rows: usize,
    fields: usize,
    order: StorageOrder,
}

impl<'a> TensorView<'a> {
    /// Creates a view with an explicit (resolved) storage order.
    pub fn new(
        data: &'a [f32],
        rows: usize,
        fields: usize,
        order: StorageOrder,
    ) -> DecodeResult<Self> {
        if order == StorageOrder::Auto {
            return Err(DecodeError::InvalidInput(
                "TensorView::new needs a resolved storage order",
            ));
        }
        if rows == 0 || fields == 0 {
            return Err(DecodeError::ShapeMismatch {
                shape: vec![rows, fields],
                reason: "tensor has an empty dimension",
            });
        }
        let needed = element_count(&[rows, fields])?;
        if data.len() < needed {
            return Err(DecodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            fields,
            order,
        })
    }

    /// Builds a view over a rank-2 or rank-3 (batch first) detection tensor.
    ///
    /// With `StorageOrder::Auto` the field axis is the trailing dimension able
    /// to hold `min_fields`; when both can, the smaller one is taken, so
    /// `1 x 84 x 8400` reads as 8400 rows of 84 fields. Equal dimensions read
    /// detection-major.
    pub fn from_tensor(
        tensor: RawTensor<'a>,
        min_fields: usize,
        order: StorageOrder,
    ) -> DecodeResult<Self> {
        let (data, dims) = tensor.first_batch(2)?;
        let (a, b) = (dims[0], dims[1]);
        let order = match order {
            StorageOrder::Auto => resolve_order(a, b, min_fields)
                .ok_or_else(|| tensor.mismatch("no axis can hold the layout's fields"))?,
            fixed => fixed,
        };
        let (rows, fields) = match order {
            StorageOrder::ChannelMajor => (b, a),
            _ => (a, b),
        };
        if fields < min_fields {
            return Err(tensor.mismatch("fewer fields than the layout requires"));
        }
        Self::new(data, rows, fields, order)
    }

    /// Builds a view over a tensor aligned row-for-row with a detection tensor.
    ///
    /// Accepts `[1, rows, K]`, `[1, rows, h, w]` (fields flattened) or the
    /// channel-major `[1, K, rows]`.
    pub fn row_aligned(tensor: RawTensor<'a>, rows: usize) -> DecodeResult<Self> {
        let shape = tensor.shape();
        if shape.len() < 3 || shape[0] == 0 {
            return Err(tensor.mismatch("row-aligned tensor needs a batch axis"));
        }
        let (data, dims) = tensor.first_batch(shape.len() - 1)?;
        if dims[0] == rows {
            let fields = element_count(&dims[1..])?;
            return Self::new(data, rows, fields, StorageOrder::DetectionMajor);
        }
        if dims.len() == 2 && dims[1] == rows {
            return Self::new(data, rows, dims[0], StorageOrder::ChannelMajor);
        }
        Err(tensor.mismatch("mask tensor rows do not align with detections"))
    }

    /// Number of detection rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of fields per row.
    pub fn fields(&self) -> usize {
        self.fields
    }

    /// Resolved storage order.
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    /// Returns field `field` of row `row` if both are in range.
    pub fn get(&self, row: usize, field: usize) -> Option<f32> {
        if row >= self.rows || field >= self.fields {
            return None;
        }
        self.data.get(self.index(row, field)).copied()
    }

    /// Returns a strided view of one row.
    pub fn row(&self, row: usize) -> Option<RowView<'a>> {
        if row >= self.rows {
            return None;
        }
        let (start, step) = match self.order {
            StorageOrder::ChannelMajor => (row, self.rows),
            _ => (row * self.fields, 1),
        };
        Some(RowView {
            data: self.data,
            start,
            step,
            len: self.fields,
        })
    }

    /// Copies the tensor into a contiguous detection-major buffer.
    pub fn to_detection_major(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.rows * self.fields);
        for row in 0..self.rows {
            for field in 0..self.fields {
                out.push(self.data[self.index(row, field)]);
            }
        }
        out
    }

    #[inline]
    fn index(&self, row: usize, field: usize) -> usize {
        match self.order {
            StorageOrder::ChannelMajor => field * self.rows + row,
            _ => row * self.fields + field,
        }
    }
}

fn resolve_order(a: usize, b: usize, min_fields: usize) -> Option<StorageOrder> {
    match (a >= min_fields, b >= min_fields) {
        (true, true) if b > a => Some(StorageOrder::ChannelMajor),
        (true, true) => Some(StorageOrder::DetectionMajor),
        (true, false) => Some(StorageOrder::ChannelMajor),
        (false, true) => Some(StorageOrder::DetectionMajor),
        (false, false) => None,
    }
}

/// Strided view of the fields of a single row.
///
/// Only produced by [`TensorView::row`], which guarantees every index below
/// `len` is inside the backing slice.
#[derive(Clone, Copy, Debug)]
pub struct RowView<'a> {
    data: &'a [f32],
    start: usize,
    step: usize,
    len: usize,
}

impl<'a> RowView<'a> {
    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns field `idx` if it is in range.
    pub fn get(&self, idx: usize) -> Option<f32> {
        if idx >= self.len {
            return None;
        }
        self.data.get(self.start + idx * self.step).copied()
    }

    /// Sub-range `[offset, offset + len)` of the row.
    pub fn slice(&self, offset: usize, len: usize) -> Option<RowView<'a>> {
        let end = offset.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(RowView {
            data: self.data,
            start: self.start + offset * self.step,
            step: self.step,
            len,
        })
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + 'a {
        let RowView {
            data,
            start,
            step,
            len,
        } = *self;
        (0..len).map(move |i| data[start + i * step])
    }

    /// Copies the row into a vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }
}
