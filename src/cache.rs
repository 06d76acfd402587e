//! Precomputed domain-block candidates.
//!
//! For every supported block size the search considers every
//! grid-aligned block of the downsampled channel as a domain candidate.
//! Candidate pixels (identity orientation) and averages do not depend
//! on the range block being matched, so they are materialized once per
//! channel before the search starts. Matching then reads candidates out
//! of contiguous memory instead of re-walking the channel for every
//! range block.

use imgref::ImgRef;

use crate::error::{Error, Result};
use crate::transform::IfsTransform;
use crate::types::{Symmetry, SUPPORTED_BLOCK_SIZES};

/// Identity pixels and averages for every candidate of one block size.
///
/// Candidates are indexed in raster order: `index = row * cols + col`,
/// with the candidate at `(col, row)` originating at
/// `(col * size, row * size)` in the downsampled channel.
pub(crate) struct SizeClassCache {
    size: usize,
    cols: usize,
    /// Candidate blocks, `size * size` bytes each, in candidate order.
    blocks: Vec<u8>,
    /// One truncated mean per candidate, same order.
    averages: Vec<i32>,
}

impl SizeClassCache {
    fn build(half: ImgRef<'_, u8>, size: usize) -> Self {
        let cols = half.width() / size;
        let rows = half.height() / size;
        let area = size * size;
        let mut blocks = vec![0u8; cols * rows * area];
        let mut averages = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let copy = IfsTransform {
                    from_x: col * size,
                    from_y: row * size,
                    to_x: 0,
                    to_y: 0,
                    size,
                    symmetry: Symmetry::Identity,
                    scale: 1.0,
                    offset: 0,
                };
                let start = (row * cols + col) * area;
                let avg = copy.apply(
                    half.buf(),
                    half.stride(),
                    &mut blocks[start..start + area],
                    size,
                );
                averages.push(avg);
            }
        }
        Self { size, cols, blocks, averages }
    }

    /// Number of candidates in this class.
    pub(crate) fn len(&self) -> usize {
        self.averages.len()
    }

    /// The identity-orientation pixels of candidate `index`.
    pub(crate) fn block(&self, index: usize) -> &[u8] {
        let area = self.size * self.size;
        &self.blocks[index * area..(index + 1) * area]
    }

    /// The truncated mean of candidate `index`.
    pub(crate) fn average(&self, index: usize) -> i32 {
        self.averages[index]
    }

    /// Downsampled-channel origin of candidate `index`.
    pub(crate) fn origin(&self, index: usize) -> (usize, usize) {
        let row = index / self.cols;
        let col = index % self.cols;
        (col * self.size, row * self.size)
    }
}

/// Per-channel candidate caches for all four block sizes.
pub(crate) struct DomainCache {
    classes: [SizeClassCache; SUPPORTED_BLOCK_SIZES.len()],
}

impl DomainCache {
    /// Materializes the candidate grid of `half` for every block size.
    pub(crate) fn build(half: ImgRef<'_, u8>) -> Self {
        let classes = SUPPORTED_BLOCK_SIZES.map(|size| SizeClassCache::build(half, size));
        Self { classes }
    }

    /// The candidate class for `size` blocks.
    pub(crate) fn class(&self, size: usize) -> Result<&SizeClassCache> {
        SUPPORTED_BLOCK_SIZES
            .iter()
            .position(|&s| s == size)
            .map(|i| &self.classes[i])
            .ok_or(Error::UnsupportedBlockSize { size })
    }
}
