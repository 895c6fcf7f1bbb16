//! Convenience helpers built on the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::geometry::FrameSize;
use crate::mask::Mask;
use crate::util::{DecodeError, DecodeResult};
use std::path::Path;

/// Converts a binary mask into a grayscale image.
pub fn mask_to_gray_image(mask: &Mask) -> DecodeResult<image::GrayImage> {
    let width = u32::try_from(mask.width())
        .map_err(|_| DecodeError::InvalidInput("mask too wide for an image"))?;
    let height = u32::try_from(mask.height())
        .map_err(|_| DecodeError::InvalidInput("mask too tall for an image"))?;
    image::GrayImage::from_raw(width, height, mask.data().to_vec()).ok_or(
        DecodeError::BufferTooSmall {
            needed: mask.width() * mask.height(),
            got: mask.data().len(),
        },
    )
}

/// Writes a mask as an 8-bit grayscale image; the format follows the extension.
pub fn save_mask<P: AsRef<Path>>(mask: &Mask, path: P) -> DecodeResult<()> {
    mask_to_gray_image(mask)?
        .save(path)
        .map_err(|err| DecodeError::ImageIo {
            reason: err.to_string(),
        })
}

/// Reads the dimensions of an image file without decoding its pixels.
pub fn frame_size_of<P: AsRef<Path>>(path: P) -> DecodeResult<FrameSize> {
    let (width, height) = image::image_dimensions(path).map_err(|err| DecodeError::ImageIo {
        reason: err.to_string(),
    })?;
    Ok(FrameSize::new(width as usize, height as usize))
}

/// Loads an image as interleaved RGB bytes with its size.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> DecodeResult<(Vec<u8>, FrameSize)> {
    let img = image::open(path).map_err(|err| DecodeError::ImageIo {
        reason: err.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let size = FrameSize::new(rgb.width() as usize, rgb.height() as usize);
    Ok((rgb.into_raw(), size))
}
