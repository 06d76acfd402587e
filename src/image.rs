//! Input image abstraction.
//!
//! The encoder pulls raw channel planes through [`ImageSource`] and never
//! sees pixel containers, color conversion or file formats. [`PlanarImage`]
//! is the bundled in-memory implementation for callers that already hold
//! planar 8-bit data.

use imgref::ImgVec;

use crate::error::{Error, Result};

/// Supplier of raw channel planes for the encoder.
///
/// Implementations report fixed dimensions and copy out one channel at a
/// time. Channels are 8-bit, row-major, unpadded. The encoder itself
/// validates dimensions (multiples of 32) and channel count (1 or 3) at
/// encode time, so sources do not have to.
pub trait ImageSource {
    /// Width in pixels.
    fn width(&self) -> usize;

    /// Height in pixels.
    fn height(&self) -> usize;

    /// Number of channels: 1 (grayscale) or 3 (luma/chroma or planar RGB).
    fn channels(&self) -> usize;

    /// Copy channel `channel` into `out`, row-major.
    ///
    /// # Panics
    ///
    /// May panic if `channel >= self.channels()` or `out` is not exactly
    /// `width() * height()` bytes.
    fn read_channel(&self, channel: usize, out: &mut [u8]);
}

/// In-memory planar image: one contiguous 8-bit plane per channel.
///
/// Holds pixels only; any color conversion (RGB to YCbCr or back) is the
/// caller's business and happens before construction.
#[derive(Debug, Clone)]
pub struct PlanarImage {
    planes: Vec<ImgVec<u8>>,
}

impl PlanarImage {
    /// Build an image from one plane per channel (1 or 3 planes).
    ///
    /// Dimensions must be non-zero and each plane must hold exactly
    /// `width * height` bytes.
    pub fn from_planes(width: usize, height: usize, planes: Vec<Vec<u8>>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "dimensions must be non-zero",
            });
        }
        if planes.len() != 1 && planes.len() != 3 {
            return Err(Error::InvalidChannelCount { channels: planes.len() });
        }
        let expected = width * height;
        let mut wrapped = Vec::with_capacity(planes.len());
        for plane in planes {
            if plane.len() != expected {
                return Err(Error::InvalidPixelData { expected, actual: plane.len() });
            }
            wrapped.push(ImgVec::new(plane, width, height));
        }
        Ok(Self { planes: wrapped })
    }

    /// Build a single-channel (grayscale) image.
    pub fn from_luma(width: usize, height: usize, plane: Vec<u8>) -> Result<Self> {
        Self::from_planes(width, height, vec![plane])
    }
}

impl ImageSource for PlanarImage {
    fn width(&self) -> usize {
        self.planes[0].width()
    }

    fn height(&self) -> usize {
        self.planes[0].height()
    }

    fn channels(&self) -> usize {
        self.planes.len()
    }

    fn read_channel(&self, channel: usize, out: &mut [u8]) {
        out.copy_from_slice(self.planes[channel].buf());
    }
}
