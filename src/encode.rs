//! Main encoder implementation
//!
//! Provides the public Encoder API: per-channel orchestration of the
//! downsample / domain-cache / quadtree-match pipeline, with top-level
//! tiles fanned out across a rayon worker pool.

use rayon::prelude::*;
use tracing::debug;

use crate::cache::DomainCache;
use crate::error::{Error, Result};
use crate::image::ImageSource;
use crate::search::SearchContext;
use crate::transform::{downsample_plane, IfsTransform, Transforms};
use crate::types::{ColorModel, SymmetryMode, MAX_BLOCK_SIZE};

/// Fractal encoder with configurable error threshold and search scope
#[derive(Debug, Clone)]
pub struct Encoder {
    threshold: u32,
    symmetry_mode: SymmetryMode,
    color_model: ColorModel,
    threads: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Create a new encoder with default settings
    pub fn new() -> Self {
        Self {
            threshold: 100,
            symmetry_mode: SymmetryMode::IdentityOnly,
            color_model: ColorModel::LumaChroma,
            threads: 0,
        }
    }

    /// Create encoder tuned for smallest output (fewest transforms)
    pub fn max_compression() -> Self {
        Self { threshold: 400, ..Self::new() }
    }

    /// Create encoder tuned for closest reconstruction
    pub fn max_quality() -> Self {
        Self {
            threshold: 25,
            symmetry_mode: SymmetryMode::Full,
            ..Self::new()
        }
    }

    /// Set the splitting threshold, in mean squared error per pixel.
    ///
    /// Blocks whose best match stays at or above this error split into
    /// quadrants, down to the 2x2 floor. Lower thresholds produce more,
    /// smaller transforms: closer reconstruction, bigger output.
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set how many orientations of each domain candidate the search tries
    pub fn symmetry_mode(mut self, mode: SymmetryMode) -> Self {
        self.symmetry_mode = mode;
        self
    }

    /// Set how channels relate for threshold purposes.
    ///
    /// Under [`ColorModel::LumaChroma`] (the default) every channel
    /// after the first matches against a doubled threshold. Use
    /// [`ColorModel::Uniform`] for planar RGB or other inputs whose
    /// channels carry equal weight.
    pub fn color_model(mut self, model: ColorModel) -> Self {
        self.color_model = model;
        self
    }

    /// Set the worker thread count. Zero (the default) uses the global
    /// rayon pool; any other value builds a dedicated pool of that size
    /// for the encode call.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Encode every channel of `source` into transform lists.
    ///
    /// Channels are processed independently: each is downsampled, its
    /// domain candidates cached, and its top-level tiles matched in
    /// parallel. Transform output is deterministic for a given
    /// configuration regardless of thread count.
    pub fn encode(&self, source: &impl ImageSource) -> Result<Transforms> {
        let width = source.width();
        let height = source.height();
        let channels = source.channels();

        self.validate_dimensions(width, height)?;
        if channels != 1 && channels != 3 {
            return Err(Error::InvalidChannelCount { channels });
        }

        // Pull the planes up front so the parallel phase only touches
        // owned buffers.
        let mut planes = Vec::with_capacity(channels);
        for channel in 0..channels {
            let mut raw = vec![0u8; width * height];
            source.read_channel(channel, &mut raw);
            planes.push(raw);
        }

        if self.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .map_err(|_| Error::Internal("failed to build worker thread pool"))?;
            pool.install(|| self.encode_planes(planes, width, height))
        } else {
            self.encode_planes(planes, width, height)
        }
    }

    fn encode_planes(
        &self,
        planes: Vec<Vec<u8>>,
        width: usize,
        height: usize,
    ) -> Result<Transforms> {
        let tiles: Vec<(usize, usize)> = (0..height)
            .step_by(MAX_BLOCK_SIZE)
            .flat_map(|y| (0..width).step_by(MAX_BLOCK_SIZE).map(move |x| (x, y)))
            .collect();

        let mut per_channel = Vec::with_capacity(planes.len());
        // Each channel's raw plane, downsampled plane and cache are
        // released before the next channel starts.
        for (channel, raw) in planes.into_iter().enumerate() {
            let threshold = self.effective_threshold(channel);
            let half = downsample_plane(&raw, width, height);
            let cache = DomainCache::build(half.as_ref());

            let ctx = SearchContext {
                range: &raw,
                width,
                cache: &cache,
                threshold,
                mode: self.symmetry_mode,
            };

            let tile_lists: Vec<Vec<IfsTransform>> = tiles
                .par_iter()
                .map(|&(x, y)| {
                    let mut found = Vec::new();
                    ctx.find_matches(x, y, MAX_BLOCK_SIZE, &mut found)?;
                    Ok(found)
                })
                .collect::<Result<_>>()?;

            let mut list = Vec::new();
            for found in tile_lists {
                list.extend(found);
            }
            debug!(channel, threshold, transforms = list.len(), "channel matched");
            per_channel.push(list);
        }
        Ok(Transforms::new(per_channel))
    }

    /// The error threshold channel `channel` is matched against.
    fn effective_threshold(&self, channel: usize) -> f64 {
        if self.color_model == ColorModel::LumaChroma && channel > 0 {
            f64::from(self.threshold) * 2.0
        } else {
            f64::from(self.threshold)
        }
    }

    /// Validate image dimensions
    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "dimensions must be non-zero",
            });
        }
        // Top-level tiles must exist on both the channel and its
        // downsampled plane.
        if width % (MAX_BLOCK_SIZE * 2) != 0 || height % (MAX_BLOCK_SIZE * 2) != 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "dimensions must be multiples of 32",
            });
        }
        Ok(())
    }
}
