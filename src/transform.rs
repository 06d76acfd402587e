//! The contractive maps fractal coding is built on.
//!
//! An [`IfsTransform`] copies one domain block onto one range block
//! through an orientation, a contrast scale and a brightness offset.
//! Replaying a channel's transform list against an arbitrary starting
//! image converges toward that channel, so these maps are the entire
//! compressed representation. This module supplies the forward
//! application (which a decoder iterates and the encoder's domain cache
//! uses to materialize candidate blocks) plus the 2x downsampling that
//! makes every map spatially contractive.

use imgref::ImgVec;

use crate::types::Symmetry;

/// Box-downsamples a square region by 2 in each direction.
///
/// Reads the `2 * target_size` square at `(x, y)` of `src` and averages
/// each non-overlapping 2x2 quad with truncating integer division,
/// producing a new `target_size` square buffer.
#[must_use]
pub fn downsample(src: &[u8], src_width: usize, x: usize, y: usize, target_size: usize) -> Vec<u8> {
    let mut dest = Vec::with_capacity(target_size * target_size);
    for sy in (y..y + target_size * 2).step_by(2) {
        for sx in (x..x + target_size * 2).step_by(2) {
            let sum = u32::from(src[sy * src_width + sx])
                + u32::from(src[sy * src_width + sx + 1])
                + u32::from(src[(sy + 1) * src_width + sx])
                + u32::from(src[(sy + 1) * src_width + sx + 1]);
            dest.push((sum / 4) as u8);
        }
    }
    dest
}

/// Box-downsamples a whole channel to `width / 2` by `height / 2`.
///
/// Same 2x2 truncating average as [`downsample`], over a rectangular
/// plane. Both dimensions must be even.
#[must_use]
pub fn downsample_plane(src: &[u8], width: usize, height: usize) -> ImgVec<u8> {
    debug_assert_eq!(width % 2, 0);
    debug_assert_eq!(height % 2, 0);
    let half_width = width / 2;
    let half_height = height / 2;
    let mut dest = Vec::with_capacity(half_width * half_height);
    for sy in (0..height).step_by(2) {
        for sx in (0..width).step_by(2) {
            let sum = u32::from(src[sy * width + sx])
                + u32::from(src[sy * width + sx + 1])
                + u32::from(src[(sy + 1) * width + sx])
                + u32::from(src[(sy + 1) * width + sx + 1]);
            dest.push((sum / 4) as u8);
        }
    }
    ImgVec::new(dest, half_width, half_height)
}

/// One contractive affine map from a domain block to a range block.
///
/// Domain coordinates live in the downsampled channel's grid; range
/// coordinates and `size` are full resolution. The spatial contraction
/// is implicit: a `size` block of the downsampled channel covers a
/// `2 * size` region of the full-resolution channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfsTransform {
    /// Domain block x origin, in downsampled-channel coordinates.
    pub from_x: usize,
    /// Domain block y origin, in downsampled-channel coordinates.
    pub from_y: usize,
    /// Range block x origin, in full-resolution coordinates.
    pub to_x: usize,
    /// Range block y origin, in full-resolution coordinates.
    pub to_y: usize,
    /// Block edge length in pixels.
    pub size: usize,
    /// Orientation the domain block is read through.
    pub symmetry: Symmetry,
    /// Contrast scale applied to each domain pixel.
    pub scale: f64,
    /// Brightness offset added after scaling.
    pub offset: i32,
}

impl IfsTransform {
    /// Applies the map.
    ///
    /// Reads the domain block out of `src` (a downsampled channel of
    /// width `src_width`) through the symmetry's traversal facets,
    /// then scales, offsets and clamps each pixel to u8 range and
    /// writes it at the range position in `dest`. The scaled value
    /// truncates toward zero before the offset is added.
    ///
    /// Returns the truncated mean of the pixels written, which is how
    /// the domain cache obtains candidate averages without a second
    /// pass.
    pub fn apply(&self, src: &[u8], src_width: usize, dest: &mut [u8], dest_width: usize) -> i32 {
        let size = self.size;
        let mut dx = 1isize;
        let mut dy = 1isize;
        let mut from_x = self.from_x as isize;
        let mut from_y = self.from_y as isize;
        if !self.symmetry.positive_x() {
            from_x += size as isize - 1;
            dx = -1;
        }
        if !self.symmetry.positive_y() {
            from_y += size as isize - 1;
            dy = -1;
        }
        let start_x = from_x;
        let start_y = from_y;
        let in_order = self.symmetry.scanline_order();

        let mut sum: u64 = 0;
        for to_y in self.to_y..self.to_y + size {
            for to_x in self.to_x..self.to_x + size {
                let pixel = f64::from(src[from_y as usize * src_width + from_x as usize]);
                let mapped = ((self.scale * pixel) as i64 + i64::from(self.offset))
                    .clamp(0, 255) as u8;
                dest[to_y * dest_width + to_x] = mapped;
                sum += u64::from(mapped);
                if in_order {
                    from_x += dx;
                } else {
                    from_y += dy;
                }
            }
            if in_order {
                from_x = start_x;
                from_y += dy;
            } else {
                from_y = start_y;
                from_x += dx;
            }
        }
        (sum / (size * size) as u64) as i32
    }

    /// Same as [`apply`](IfsTransform::apply), but reads the
    /// full-resolution channel and downsamples the `2 * size` source
    /// region on the fly. Produces the same pixels `apply` would
    /// produce against the whole downsampled channel.
    pub fn apply_from_source(
        &self,
        src: &[u8],
        src_width: usize,
        dest: &mut [u8],
        dest_width: usize,
    ) -> i32 {
        let block = downsample(src, src_width, self.from_x * 2, self.from_y * 2, self.size);
        let local = IfsTransform { from_x: 0, from_y: 0, ..*self };
        local.apply(&block, self.size, dest, dest_width)
    }
}

/// Transform lists for every channel of an encoded image, luma first.
///
/// Within a channel the transforms appear in raster order of the
/// top-level tiles they were found under, so output is deterministic
/// regardless of worker count.
#[derive(Debug, Clone, Default)]
pub struct Transforms {
    channels: Vec<Vec<IfsTransform>>,
}

impl Transforms {
    pub(crate) fn new(channels: Vec<Vec<IfsTransform>>) -> Self {
        Self { channels }
    }

    /// Number of channels encoded.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// The transform list for one channel.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &[IfsTransform] {
        &self.channels[channel]
    }

    /// Total transform count across all channels, the usual figure of
    /// merit when comparing quality thresholds.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    /// True when no channel holds any transform.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Iterates over every transform of every channel.
    pub fn iter(&self) -> impl Iterator<Item = &IfsTransform> {
        self.channels.iter().flatten()
    }
}
