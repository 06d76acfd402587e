//! Quadtree range-block matching.
//!
//! Each top-level tile is matched greedily: find the lowest-error domain
//! candidate for the whole block, and either commit a transform or (if
//! the fit is still at or above the threshold and the block can split)
//! recurse into the four quadrants. Strict less-than comparison means
//! the earliest candidate in scan order wins ties, which keeps results
//! deterministic across runs and worker counts.

use tracing::trace;

use crate::cache::DomainCache;
use crate::error::Result;
use crate::kernels::{average_pixel, block_error, scale_factor};
use crate::transform::IfsTransform;
use crate::types::{Symmetry, SymmetryMode, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};

/// Read-only per-channel state shared by every worker while a channel
/// is being matched.
pub(crate) struct SearchContext<'a> {
    /// Full-resolution channel pixels.
    pub(crate) range: &'a [u8],
    /// Channel width in pixels.
    pub(crate) width: usize,
    /// Domain candidates drawn from the channel's downsampled plane.
    pub(crate) cache: &'a DomainCache,
    /// Effective error threshold for this channel, chroma doubling
    /// already applied.
    pub(crate) threshold: f64,
    /// Orientation coverage of the candidate scan.
    pub(crate) mode: SymmetryMode,
}

/// Winning candidate of one scan.
struct Candidate {
    from_x: usize,
    from_y: usize,
    symmetry: Symmetry,
    scale: f64,
    offset: i32,
    error: f64,
}

impl Candidate {
    fn none() -> Self {
        Candidate {
            from_x: 0,
            from_y: 0,
            symmetry: Symmetry::Identity,
            scale: 0.0,
            offset: 0,
            error: f64::INFINITY,
        }
    }
}

/// Scale, offset and error of one candidate orientation against one
/// range block.
struct Fit {
    scale: f64,
    offset: i32,
    error: f64,
}

impl SearchContext<'_> {
    /// Matches the `size` range block at `(to_x, to_y)`: appends one
    /// transform to `out`, or splits into quadrants and recurses.
    pub(crate) fn find_matches(
        &self,
        to_x: usize,
        to_y: usize,
        size: usize,
        out: &mut Vec<IfsTransform>,
    ) -> Result<()> {
        let range_avg = average_pixel(self.range, self.width, to_x, to_y, size)?;
        let best = self.best_candidate(to_x, to_y, size, range_avg)?;

        if size > MIN_BLOCK_SIZE && best.error >= self.threshold {
            let half = size / 2;
            self.find_matches(to_x, to_y, half, out)?;
            self.find_matches(to_x + half, to_y, half, out)?;
            self.find_matches(to_x, to_y + half, half, out)?;
            self.find_matches(to_x + half, to_y + half, half, out)?;
        } else {
            trace!(to_x, to_y, size, error = best.error, "committing transform");
            out.push(IfsTransform {
                from_x: best.from_x,
                from_y: best.from_y,
                to_x,
                to_y,
                size,
                symmetry: best.symmetry,
                scale: best.scale,
                offset: best.offset,
            });
        }
        Ok(())
    }

    /// Scans every domain candidate of `size` (every orientation of
    /// every candidate in full-symmetry mode) and keeps the lowest
    /// error fit.
    fn best_candidate(
        &self,
        to_x: usize,
        to_y: usize,
        size: usize,
        range_avg: i32,
    ) -> Result<Candidate> {
        let class = self.cache.class(size)?;
        let mut best = Candidate::none();
        let mut oriented = [0u8; MAX_BLOCK_SIZE * MAX_BLOCK_SIZE];

        for index in 0..class.len() {
            let (from_x, from_y) = class.origin(index);
            match self.mode {
                SymmetryMode::IdentityOnly => {
                    let fit = self.evaluate(
                        class.block(index),
                        class.average(index),
                        to_x,
                        to_y,
                        size,
                        range_avg,
                    )?;
                    if fit.error < best.error {
                        best = Candidate {
                            from_x,
                            from_y,
                            symmetry: Symmetry::Identity,
                            scale: fit.scale,
                            offset: fit.offset,
                            error: fit.error,
                        };
                    }
                }
                SymmetryMode::Full => {
                    for symmetry in Symmetry::ALL {
                        let reorient = IfsTransform {
                            from_x: 0,
                            from_y: 0,
                            to_x: 0,
                            to_y: 0,
                            size,
                            symmetry,
                            scale: 1.0,
                            offset: 0,
                        };
                        let domain_avg =
                            reorient.apply(class.block(index), size, &mut oriented[..size * size], size);
                        let fit = self.evaluate(
                            &oriented[..size * size],
                            domain_avg,
                            to_x,
                            to_y,
                            size,
                            range_avg,
                        )?;
                        if fit.error < best.error {
                            best = Candidate {
                                from_x,
                                from_y,
                                symmetry,
                                scale: fit.scale,
                                offset: fit.offset,
                                error: fit.error,
                            };
                        }
                    }
                }
            }
        }
        Ok(best)
    }

    /// Fits one oriented domain block against the range block at
    /// `(to_x, to_y)`: least-squares scale, rounded brightness offset,
    /// mean squared error.
    fn evaluate(
        &self,
        domain: &[u8],
        domain_avg: i32,
        to_x: usize,
        to_y: usize,
        size: usize,
        range_avg: i32,
    ) -> Result<Fit> {
        let scale = scale_factor(
            domain, domain_avg, self.range, self.width, to_x, to_y, range_avg, size,
        )?;
        let offset = range_avg - (scale * f64::from(domain_avg)).round() as i32;
        let error = block_error(
            domain, domain_avg, self.range, self.width, to_x, to_y, range_avg, size, scale,
        )?;
        Ok(Fit { scale, offset, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::downsample_plane;

    #[test]
    fn test_flat_tile_commits_at_top_level() {
        let range = vec![77u8; 32 * 32];
        let half = downsample_plane(&range, 32, 32);
        let cache = DomainCache::build(half.as_ref());
        let ctx = SearchContext {
            range: &range,
            width: 32,
            cache: &cache,
            threshold: 25.0,
            mode: SymmetryMode::IdentityOnly,
        };

        let mut out = Vec::new();
        ctx.find_matches(0, 0, MAX_BLOCK_SIZE, &mut out).unwrap();

        assert_eq!(out.len(), 1);
        let t = out[0];
        assert_eq!(t.size, MAX_BLOCK_SIZE);
        assert_eq!(t.scale, 0.0);
        assert_eq!(t.offset, 77);
        // Every candidate fits a flat tile with zero error; the first
        // one in scan order must win.
        assert_eq!((t.from_x, t.from_y), (0, 0));
        assert_eq!(t.symmetry, Symmetry::Identity);
    }

    #[test]
    fn test_zero_threshold_splits_to_floor() {
        let range = vec![128u8; 32 * 32];
        let half = downsample_plane(&range, 32, 32);
        let cache = DomainCache::build(half.as_ref());
        let ctx = SearchContext {
            range: &range,
            width: 32,
            cache: &cache,
            threshold: 0.0,
            mode: SymmetryMode::IdentityOnly,
        };

        let mut out = Vec::new();
        ctx.find_matches(0, 0, MAX_BLOCK_SIZE, &mut out).unwrap();

        // Zero error is still >= a zero threshold, so the tile splits
        // all the way down to the 2x2 floor and stops there.
        assert_eq!(out.len(), 64);
        assert!(out.iter().all(|t| t.size == MIN_BLOCK_SIZE));
    }

    #[test]
    fn test_committed_blocks_tile_the_search_area() {
        let range: Vec<u8> = (0..32u32 * 32).map(|i| ((i * 41 + 3) % 256) as u8).collect();
        let half = downsample_plane(&range, 32, 32);
        let cache = DomainCache::build(half.as_ref());
        let ctx = SearchContext {
            range: &range,
            width: 32,
            cache: &cache,
            threshold: 150.0,
            mode: SymmetryMode::IdentityOnly,
        };

        let mut out = Vec::new();
        ctx.find_matches(16, 16, MAX_BLOCK_SIZE, &mut out).unwrap();

        let mut covered = vec![false; 16 * 16];
        for t in &out {
            assert!(t.to_x >= 16 && t.to_x + t.size <= 32);
            assert!(t.to_y >= 16 && t.to_y + t.size <= 32);
            for y in 0..t.size {
                for x in 0..t.size {
                    let cell = (t.to_y - 16 + y) * 16 + (t.to_x - 16 + x);
                    assert!(!covered[cell], "overlap at ({}, {})", t.to_x + x, t.to_y + y);
                    covered[cell] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c));
    }
}
