//! Core types for zenfractal

/// Smallest range block the quadtree search will commit a transform for.
pub const MIN_BLOCK_SIZE: usize = 2;

/// Largest range block, and the edge length of the top-level tiles the
/// encoder cuts each channel into.
pub const MAX_BLOCK_SIZE: usize = 16;

/// Block sizes the numeric kernels and the domain cache handle.
///
/// Quadtree splitting starts at [`MAX_BLOCK_SIZE`] and halves down to
/// [`MIN_BLOCK_SIZE`], so only powers of two in that range ever occur.
pub const SUPPORTED_BLOCK_SIZES: [usize; 4] = [2, 4, 8, 16];

/// One of the eight isometries of a square block (the dihedral group).
///
/// A domain block is read through one of these orientations before scaling,
/// which lets a match reuse image structure that appears rotated or
/// mirrored elsewhere. Every orientation decomposes into three independent
/// traversal facets ([`scanline_order`](Symmetry::scanline_order),
/// [`positive_x`](Symmetry::positive_x), [`positive_y`](Symmetry::positive_y))
/// that drive the block walk in [`IfsTransform::apply`](crate::IfsTransform::apply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Symmetry {
    /// Read the block as-is
    #[default]
    Identity,
    /// Rotate 90 degrees clockwise
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
    /// Mirror across the vertical axis
    FlipHorizontal,
    /// Mirror across the horizontal axis
    FlipVertical,
    /// Transpose across the main diagonal
    FlipMainDiagonal,
    /// Transpose across the anti-diagonal
    FlipAntiDiagonal,
}

impl Symmetry {
    /// All eight orientations, identity first. Candidate scans evaluate
    /// them in this order, so earlier entries win error ties.
    pub const ALL: [Symmetry; 8] = [
        Symmetry::Identity,
        Symmetry::Rotate90,
        Symmetry::Rotate180,
        Symmetry::Rotate270,
        Symmetry::FlipHorizontal,
        Symmetry::FlipVertical,
        Symmetry::FlipMainDiagonal,
        Symmetry::FlipAntiDiagonal,
    ];

    /// Whether destination rows map to source rows (a row-major read).
    /// When false the walk is column-major: each destination row follows
    /// one source column.
    #[must_use]
    pub const fn scanline_order(self) -> bool {
        matches!(
            self,
            Symmetry::Identity
                | Symmetry::Rotate180
                | Symmetry::FlipHorizontal
                | Symmetry::FlipVertical
        )
    }

    /// Whether the source x coordinate advances forward from the block
    /// origin. When false it starts at the far edge and steps backward.
    #[must_use]
    pub const fn positive_x(self) -> bool {
        matches!(
            self,
            Symmetry::Identity
                | Symmetry::Rotate90
                | Symmetry::FlipVertical
                | Symmetry::FlipMainDiagonal
        )
    }

    /// Whether the source y coordinate advances forward from the block
    /// origin. When false it starts at the far edge and steps backward.
    #[must_use]
    pub const fn positive_y(self) -> bool {
        matches!(
            self,
            Symmetry::Identity
                | Symmetry::Rotate270
                | Symmetry::FlipHorizontal
                | Symmetry::FlipMainDiagonal
        )
    }

    /// Recompose an orientation from its three traversal facets.
    ///
    /// The facet triple is a bijection onto the eight orientations, so
    /// `from_facets(s.scanline_order(), s.positive_x(), s.positive_y()) == s`
    /// for every `s`.
    #[must_use]
    pub const fn from_facets(scanline_order: bool, positive_x: bool, positive_y: bool) -> Symmetry {
        match (scanline_order, positive_x, positive_y) {
            (true, true, true) => Symmetry::Identity,
            (true, true, false) => Symmetry::FlipVertical,
            (true, false, true) => Symmetry::FlipHorizontal,
            (true, false, false) => Symmetry::Rotate180,
            (false, true, true) => Symmetry::FlipMainDiagonal,
            (false, true, false) => Symmetry::Rotate90,
            (false, false, true) => Symmetry::Rotate270,
            (false, false, false) => Symmetry::FlipAntiDiagonal,
        }
    }
}

/// How many orientations the candidate scan tries per domain block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetryMode {
    /// Identity only. The search reads cached domain blocks directly,
    /// which is roughly 8x faster and costs little quality on natural
    /// images, so it is the default.
    #[default]
    IdentityOnly,
    /// Try all eight orientations of every candidate.
    Full,
}

/// How channels relate for threshold purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorModel {
    /// The first channel is luma, the rest are chroma. Chroma channels
    /// match against a doubled error threshold since the eye tolerates
    /// more chroma distortion.
    #[default]
    LumaChroma,
    /// All channels are equally important (e.g. planar RGB input);
    /// every channel uses the configured threshold unchanged.
    Uniform,
}
