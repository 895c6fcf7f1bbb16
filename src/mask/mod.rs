//! Per-detection segmentation masks.
//!
//! A mask field is either reconstructed from coefficients and a shared
//! prototype basis, or read directly from an inline square field carried per
//! row. Fields are normalized to 8 bits, resampled onto the detection box and
//! binarized; mask pixels are `0` or `255`.

pub(crate) mod project;
pub mod resample;

pub use project::MaskProjector;

use crate::tensor::RawTensor;
use crate::util::math::exact_sqrt;
use crate::util::{DecodeError, DecodeResult};

/// Mapping from a raw field to 8-bit intensities before thresholding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskActivation {
    /// Min-max stretch to `[0, 255]`; a constant field maps to 0.
    #[default]
    MinMax,
    /// Logistic squash to `[0, 255]`.
    Sigmoid,
}

/// Mask projection settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskConfig {
    /// Produce masks when the model provides mask data.
    pub enabled: bool,
    /// Foreground cutoff in `[0, 1]`, applied to the 8-bit field as
    /// `value > threshold * 255`.
    pub threshold: f32,
    /// Field normalization.
    pub activation: MaskActivation,
    /// In coefficient mode, sample only the prototype window under the box
    /// instead of stretching the whole field over it.
    pub crop_to_box: bool,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.5,
            activation: MaskActivation::MinMax,
            crop_to_box: false,
        }
    }
}

/// Binary mask sized to a detection's clipped box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Wraps a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> DecodeResult<Self> {
        let needed = width
            .checked_mul(height)
            .ok_or(DecodeError::InvalidInput("mask dimensions overflow"))?;
        if data.len() != needed {
            return Err(DecodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Mask width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)` if in bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Shared prototype basis of shape `[M, protoH, protoW]`.
#[derive(Clone, Copy, Debug)]
pub struct Prototypes<'a> {
    data: &'a [f32],
    count: usize,
    height: usize,
    width: usize,
}

impl<'a> Prototypes<'a> {
    /// Reads `[M, h, w]` or `[1, M, h, w]`.
    pub fn from_tensor(tensor: RawTensor<'a>) -> DecodeResult<Self> {
        let (data, dims) = tensor.first_batch(3)?;
        Ok(Self {
            data,
            count: dims[0],
            height: dims[1],
            width: dims[2],
        })
    }

    /// Number of prototypes (M).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Prototype height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Prototype width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Prototype plane `k`.
    pub fn plane(&self, k: usize) -> Option<&'a [f32]> {
        let len = self.height * self.width;
        let start = k.checked_mul(len)?;
        if k >= self.count {
            return None;
        }
        self.data.get(start..start + len)
    }

    /// Weighted sum of the planes.
    pub fn combine(&self, coeffs: &[f32]) -> DecodeResult<Vec<f32>> {
        if coeffs.len() != self.count {
            return Err(DecodeError::ShapeMismatch {
                shape: vec![self.count, self.height, self.width],
                reason: "coefficient count differs from prototype count",
            });
        }
        let mut field = vec![0.0f32; self.height * self.width];
        for (k, &coeff) in coeffs.iter().enumerate() {
            if coeff == 0.0 {
                continue;
            }
            let plane = self.plane(k).ok_or(DecodeError::IndexOutOfBounds {
                index: k,
                len: self.count,
                context: "prototype",
            })?;
            for (acc, &value) in field.iter_mut().zip(plane) {
                *acc += coeff * value;
            }
        }
        Ok(field)
    }
}

/// Where a detection's mask field comes from.
#[derive(Clone, Copy, Debug)]
pub enum MaskSource<'a> {
    /// Coefficients combined with prototypes.
    Coefficients(Prototypes<'a>),
    /// The coefficients are themselves a `side x side` field.
    Inline { side: usize },
}

impl<'a> MaskSource<'a> {
    /// Picks the mask mode from the tensors present.
    ///
    /// Returns `None` when the model carries no mask data.
    pub fn resolve(
        prototypes: Option<Prototypes<'a>>,
        coeff_len: usize,
    ) -> DecodeResult<Option<Self>> {
        match (prototypes, coeff_len) {
            (None, 0) => return Ok(None),
            (Some(protos), 0) => {
                return Err(DecodeError::ShapeMismatch {
                    shape: vec![protos.count(), protos.height(), protos.width()],
                    reason: "prototypes given but rows carry no coefficients",
                })
            }
            _ => {}
        }
        match prototypes {
            Some(protos) if protos.count() == coeff_len => {
                Ok(Some(MaskSource::Coefficients(protos)))
            }
            Some(protos) => Err(DecodeError::ShapeMismatch {
                shape: vec![protos.count(), protos.height(), protos.width()],
                reason: "coefficient count differs from prototype count",
            }),
            None => match exact_sqrt(coeff_len) {
                Some(side) => Ok(Some(MaskSource::Inline { side })),
                None => Err(DecodeError::ShapeMismatch {
                    shape: vec![coeff_len],
                    reason: "inline mask field is not square",
                }),
            },
        }
    }
}
