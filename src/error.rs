//! Error types for zenfractal

use std::fmt;

/// Result type for zenfractal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for zenfractal operations
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid image dimensions
    InvalidDimensions {
        width: usize,
        height: usize,
        reason: &'static str,
    },
    /// Channel count the encoder does not support
    InvalidChannelCount {
        channels: usize,
    },
    /// Invalid pixel data
    InvalidPixelData {
        expected: usize,
        actual: usize,
    },
    /// A checked accumulator overflowed inside a numeric kernel
    AccumulatorOverflow {
        kernel: &'static str,
    },
    /// Block size outside the set the kernels and domain cache handle
    UnsupportedBlockSize {
        size: usize,
    },
    /// Internal encoder error
    Internal(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDimensions { width, height, reason } => {
                write!(f, "Invalid dimensions {}x{}: {}", width, height, reason)
            }
            Error::InvalidChannelCount { channels } => {
                write!(f, "Unsupported channel count {} (expected 1 or 3)", channels)
            }
            Error::InvalidPixelData { expected, actual } => {
                write!(f, "Expected {} bytes of pixel data, got {}", expected, actual)
            }
            Error::AccumulatorOverflow { kernel } => {
                write!(f, "Accumulator overflow in {}", kernel)
            }
            Error::UnsupportedBlockSize { size } => {
                write!(f, "Unsupported block size {} (expected 2, 4, 8 or 16)", size)
            }
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions {
            width: 100,
            height: 64,
            reason: "width must be a multiple of 32",
        };
        assert!(err.to_string().contains("100x64"));

        let err = Error::AccumulatorOverflow { kernel: "block_error" };
        assert!(err.to_string().contains("block_error"));

        let err = Error::UnsupportedBlockSize { size: 7 };
        assert!(err.to_string().contains('7'));
    }
}
