//! Block-matching numeric kernels.
//!
//! Three integer-exact measurements drive the quadtree search: block
//! averages, least-squares contrast scaling, and mean squared prediction
//! error. Fractional values truncate toward zero (the integer-cast
//! semantics the transform replay relies on) and every accumulation is
//! overflow-checked.
//!
//! SIMD variants are available via the `simd` feature (enabled by
//! default) and produce bit-identical results to the scalar reference
//! implementations: the lane math stays in f64 on integer-valued inputs
//! far below 2^53, and truncation happens per lane with the same cast.
//!
//! Domain blocks arrive as contiguous `size * size` buffers (the domain
//! cache stores them that way); range blocks are views into the full
//! resolution channel at a given origin.

use crate::error::{Error, Result};
use crate::types::SUPPORTED_BLOCK_SIZES;

/// Rejects block sizes the quadtree never produces.
#[inline]
fn ensure_block_size(size: usize) -> Result<()> {
    if SUPPORTED_BLOCK_SIZES.contains(&size) {
        Ok(())
    } else {
        Err(Error::UnsupportedBlockSize { size })
    }
}

/// Integer-truncated mean of the `size`x`size` block at `(x, y)`.
///
/// Uses SIMD lane accumulators for blocks of 4 pixels and up.
///
/// # Errors
///
/// Returns an error for unsupported block sizes or accumulator overflow.
#[cfg(feature = "simd")]
pub fn average_pixel(buf: &[u8], width: usize, x: usize, y: usize, size: usize) -> Result<i32> {
    ensure_block_size(size)?;
    if size < 4 {
        return average_scalar(buf, width, x, y, size);
    }
    let sum = simd::sum_block(buf, width, x, y, size);
    Ok((sum / (size * size) as i64) as i32)
}

/// Integer-truncated mean of the `size`x`size` block at `(x, y)` (scalar version).
///
/// # Errors
///
/// Returns an error for unsupported block sizes or accumulator overflow.
#[cfg(not(feature = "simd"))]
pub fn average_pixel(buf: &[u8], width: usize, x: usize, y: usize, size: usize) -> Result<i32> {
    ensure_block_size(size)?;
    average_scalar(buf, width, x, y, size)
}

/// Scalar reference for the block mean. Also covers 2x2 blocks in SIMD builds.
fn average_scalar(buf: &[u8], width: usize, x: usize, y: usize, size: usize) -> Result<i32> {
    let mut sum = 0i64;
    for row in y..y + size {
        for col in x..x + size {
            sum = sum
                .checked_add(i64::from(buf[row * width + col]))
                .ok_or(Error::AccumulatorOverflow { kernel: "average_pixel" })?;
        }
    }
    Ok((sum / (size * size) as i64) as i32)
}

/// Least-squares contrast scale mapping domain deltas onto range deltas.
///
/// Computes `sum((d - davg) * (r - ravg)) / sum((d - davg)^2)` over the
/// block pair. A zero denominator (flat domain block) yields scale 0.0,
/// which the caller turns into a pure-offset transform.
///
/// # Errors
///
/// Returns an error for unsupported block sizes or accumulator overflow.
#[allow(clippy::too_many_arguments)]
pub fn scale_factor(
    domain: &[u8],
    domain_avg: i32,
    range: &[u8],
    range_width: usize,
    range_x: usize,
    range_y: usize,
    range_avg: i32,
    size: usize,
) -> Result<f64> {
    ensure_block_size(size)?;
    let mut top = 0i64;
    let mut bottom = 0i64;
    for y in 0..size {
        let drow = &domain[y * size..(y + 1) * size];
        let rbase = (range_y + y) * range_width + range_x;
        for x in 0..size {
            let d = i64::from(drow[x]) - i64::from(domain_avg);
            let r = i64::from(range[rbase + x]) - i64::from(range_avg);
            top = top
                .checked_add(d * r)
                .ok_or(Error::AccumulatorOverflow { kernel: "scale_factor" })?;
            bottom = bottom
                .checked_add(d * d)
                .ok_or(Error::AccumulatorOverflow { kernel: "scale_factor" })?;
        }
    }
    if bottom == 0 {
        return Ok(0.0);
    }
    Ok(top as f64 / bottom as f64)
}

/// Mean squared error of predicting the range block from the domain
/// block under `scale`.
///
/// Each pixel contributes `(truncate(scale * (d - davg)) - (r - ravg))^2`;
/// the sum is divided by the pixel count. Uses SIMD for the delta
/// scaling on blocks of 4 pixels and up.
///
/// # Errors
///
/// Returns an error for unsupported block sizes or accumulator overflow.
#[cfg(feature = "simd")]
#[allow(clippy::too_many_arguments)]
pub fn block_error(
    domain: &[u8],
    domain_avg: i32,
    range: &[u8],
    range_width: usize,
    range_x: usize,
    range_y: usize,
    range_avg: i32,
    size: usize,
    scale: f64,
) -> Result<f64> {
    ensure_block_size(size)?;
    if size < 4 {
        let sum = sum_squared_diffs_scalar(
            domain, domain_avg, range, range_width, range_x, range_y, range_avg, size, scale,
        )?;
        return Ok(sum as f64 / (size * size) as f64);
    }

    let mut sum = 0i64;
    for y in 0..size {
        let drow = &domain[y * size..(y + 1) * size];
        let rbase = (range_y + y) * range_width + range_x;
        for x in (0..size).step_by(4) {
            let scaled = simd::scaled_deltas_x4(
                [drow[x], drow[x + 1], drow[x + 2], drow[x + 3]],
                domain_avg,
                scale,
            );
            // Truncation and the checked square/accumulate stay scalar,
            // in the same lane order as the reference loop.
            for (lane, &value) in scaled.iter().enumerate() {
                let r = i32::from(range[rbase + x + lane]) - range_avg;
                sum = accumulate_squared_diff(sum, value, r)?;
            }
        }
    }
    Ok(sum as f64 / (size * size) as f64)
}

/// Mean squared error of predicting the range block from the domain
/// block under `scale` (scalar version).
///
/// # Errors
///
/// Returns an error for unsupported block sizes or accumulator overflow.
#[cfg(not(feature = "simd"))]
#[allow(clippy::too_many_arguments)]
pub fn block_error(
    domain: &[u8],
    domain_avg: i32,
    range: &[u8],
    range_width: usize,
    range_x: usize,
    range_y: usize,
    range_avg: i32,
    size: usize,
    scale: f64,
) -> Result<f64> {
    ensure_block_size(size)?;
    let sum = sum_squared_diffs_scalar(
        domain, domain_avg, range, range_width, range_x, range_y, range_avg, size, scale,
    )?;
    Ok(sum as f64 / (size * size) as f64)
}

/// Scalar reference for the squared-difference sum. Also covers 2x2
/// blocks in SIMD builds.
#[allow(clippy::too_many_arguments)]
fn sum_squared_diffs_scalar(
    domain: &[u8],
    domain_avg: i32,
    range: &[u8],
    range_width: usize,
    range_x: usize,
    range_y: usize,
    range_avg: i32,
    size: usize,
    scale: f64,
) -> Result<i64> {
    let mut sum = 0i64;
    for y in 0..size {
        let drow = &domain[y * size..(y + 1) * size];
        let rbase = (range_y + y) * range_width + range_x;
        for x in 0..size {
            let scaled = scale * f64::from(i32::from(drow[x]) - domain_avg);
            let r = i32::from(range[rbase + x]) - range_avg;
            sum = accumulate_squared_diff(sum, scaled, r)?;
        }
    }
    Ok(sum)
}

/// Truncates one scaled domain delta, squares its difference against the
/// range delta and folds it into the running sum with overflow checks.
#[inline]
fn accumulate_squared_diff(sum: i64, scaled: f64, range_delta: i32) -> Result<i64> {
    let diff = scaled as i64 - i64::from(range_delta);
    let squared = diff
        .checked_mul(diff)
        .ok_or(Error::AccumulatorOverflow { kernel: "block_error" })?;
    sum.checked_add(squared)
        .ok_or(Error::AccumulatorOverflow { kernel: "block_error" })
}

// SIMD-accelerated block measurements
#[cfg(feature = "simd")]
mod simd {
    use wide::{f64x4, i32x4};

    /// Scales four domain deltas at once.
    #[inline]
    pub(super) fn scaled_deltas_x4(pixels: [u8; 4], domain_avg: i32, scale: f64) -> [f64; 4] {
        let deltas = f64x4::from([
            f64::from(i32::from(pixels[0]) - domain_avg),
            f64::from(i32::from(pixels[1]) - domain_avg),
            f64::from(i32::from(pixels[2]) - domain_avg),
            f64::from(i32::from(pixels[3]) - domain_avg),
        ]);
        (deltas * f64x4::splat(scale)).to_array()
    }

    /// Sums a block with four lane accumulators. Lane partials stay
    /// below 64 * 255 for the supported block sizes, well inside i32.
    #[inline]
    pub(super) fn sum_block(buf: &[u8], width: usize, x: usize, y: usize, size: usize) -> i64 {
        debug_assert_eq!(size % 4, 0);
        let mut acc = i32x4::splat(0);
        for row in 0..size {
            let base = (y + row) * width + x;
            for col in (0..size).step_by(4) {
                let p = &buf[base + col..base + col + 4];
                acc += i32x4::from([
                    i32::from(p[0]),
                    i32::from(p[1]),
                    i32::from(p[2]),
                    i32::from(p[3]),
                ]);
            }
        }
        let lanes = acc.to_array();
        i64::from(lanes[0]) + i64::from(lanes[1]) + i64::from(lanes[2]) + i64::from(lanes[3])
    }
}
