//! # zenfractal - Fractal (IFS) Image Encoder
//!
//! zenfractal compresses 8-bit image channels into lists of contractive
//! affine maps: every block of the image is approximated by a
//! downsampled, re-oriented, contrast-scaled copy of some other region
//! of the same image. Decoding is just iterating the maps from an
//! arbitrary starting image; this crate implements the expensive half,
//! the encoder-side search.
//!
//! ## Key Features
//!
//! - **Quadtree partitioning**: blocks that match poorly split into
//!   quadrants, from 16x16 tiles down to a 2x2 floor
//! - **Cached domain candidates**: per-channel candidate pixels and
//!   averages are materialized once and shared by all workers
//! - **Parallel tile matching**: top-level tiles fan out across a rayon
//!   worker pool, with output independent of the thread count
//! - **Integer-exact kernels**: truncating arithmetic with checked
//!   accumulators, bit-identical between the SIMD and scalar paths
//!
//! ## Usage
//!
//! ```
//! use zenfractal::{Encoder, PlanarImage};
//!
//! # fn main() -> zenfractal::Result<()> {
//! let image = PlanarImage::from_luma(32, 32, vec![128; 32 * 32])?;
//! let transforms = Encoder::new().threshold(50).encode(&image)?;
//! assert_eq!(transforms.channel(0).len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! Images are planar, 8-bit, with both dimensions multiples of 32.
//! Color conversion (and any file I/O) happens outside this crate: feed
//! it luma/chroma planes and chroma channels automatically tolerate
//! twice the configured error, or feed it planar RGB together with
//! [`ColorModel::Uniform`].

// Core modules
mod error;
mod types;

// Encoding pipeline
mod cache;
mod encode;
mod image;
mod kernels;
mod search;
mod transform;

// Public API
pub use encode::Encoder;
pub use error::Error;
pub use image::{ImageSource, PlanarImage};
pub use transform::{downsample, downsample_plane, IfsTransform, Transforms};
pub use types::{
    ColorModel, Symmetry, SymmetryMode, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, SUPPORTED_BLOCK_SIZES,
};

/// Result type for zenfractal operations
pub type Result<T> = std::result::Result<T, Error>;
