//! Quadtree partitioning tests for zenfractal, through the public API.

use zenfractal::{
    ColorModel, Encoder, Error, ImageSource, PlanarImage, Symmetry, SymmetryMode, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE,
};

/// Create a single-value plane
fn create_flat_plane(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Create a plane with enough high-frequency detail that strict
/// thresholds keep splitting
fn create_textured_plane(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x * 31 + y * 17 + x * y) % 256) as u8);
        }
    }
    pixels
}

#[test]
fn test_flat_image_commits_one_transform_per_tile() {
    for threshold in [1, 100, 10_000] {
        let image = PlanarImage::from_luma(32, 32, create_flat_plane(32, 32, 200)).unwrap();
        let transforms = Encoder::new().threshold(threshold).encode(&image).unwrap();

        assert_eq!(transforms.channels(), 1);
        let list = transforms.channel(0);
        assert_eq!(
            list.len(),
            4,
            "threshold {}: expected one transform per 16x16 tile",
            threshold
        );
        for t in list {
            assert_eq!(t.size, MAX_BLOCK_SIZE);
            assert_eq!(t.scale, 0.0, "flat domain blocks carry no contrast");
            assert_eq!(t.offset, 200);
            // Every candidate ties at zero error, so the first one scanned wins.
            assert_eq!((t.from_x, t.from_y), (0, 0));
            assert_eq!(t.symmetry, Symmetry::Identity);
        }
    }
}

#[test]
fn test_zero_threshold_splits_to_the_floor() {
    // Zero can never exceed a block's error, not even an exact match's,
    // so the quadtree recurses until the minimum block size stops it.
    let image = PlanarImage::from_luma(32, 32, create_flat_plane(32, 32, 64)).unwrap();
    let transforms = Encoder::new().threshold(0).encode(&image).unwrap();

    let list = transforms.channel(0);
    assert_eq!(list.len(), 256);
    assert!(list.iter().all(|t| t.size == MIN_BLOCK_SIZE));
}

#[test]
fn test_saturating_threshold_commits_every_tile() {
    // The fitted error of any candidate is bounded by the range block's
    // own variance, which for 8-bit pixels stays far below 100_000. Such
    // a threshold therefore commits at the top level on any content.
    let width = 64;
    let height = 32;
    let image =
        PlanarImage::from_luma(width, height, create_textured_plane(width, height)).unwrap();
    let transforms = Encoder::new().threshold(100_000).encode(&image).unwrap();

    let list = transforms.channel(0);
    assert_eq!(
        list.len(),
        (width / MAX_BLOCK_SIZE) * (height / MAX_BLOCK_SIZE)
    );
    assert!(list.iter().all(|t| t.size == MAX_BLOCK_SIZE));
}

#[test]
fn test_committed_blocks_partition_the_image() {
    let width = 64;
    let height = 32;
    let plane = create_textured_plane(width, height);

    for encoder in [
        Encoder::new(),
        Encoder::max_compression(),
        Encoder::max_quality(),
        Encoder::new().threshold(0),
    ] {
        let image = PlanarImage::from_luma(width, height, plane.clone()).unwrap();
        let transforms = encoder.encode(&image).unwrap();

        let mut covered = vec![0u32; width * height];
        for t in transforms.channel(0) {
            assert!(
                [2, 4, 8, 16].contains(&t.size),
                "unexpected block size {}",
                t.size
            );
            assert_eq!(t.to_x % t.size, 0, "range blocks stay quadrant-aligned");
            assert_eq!(t.to_y % t.size, 0, "range blocks stay quadrant-aligned");
            assert_eq!(t.from_x % t.size, 0, "domain origins snap to the candidate grid");
            assert_eq!(t.from_y % t.size, 0, "domain origins snap to the candidate grid");
            assert!(t.from_x + t.size <= width / 2);
            assert!(t.from_y + t.size <= height / 2);
            for y in t.to_y..t.to_y + t.size {
                for x in t.to_x..t.to_x + t.size {
                    covered[y * width + x] += 1;
                }
            }
        }
        assert!(
            covered.iter().all(|&c| c == 1),
            "every pixel must be written by exactly one transform"
        );
    }
}

#[test]
fn test_higher_thresholds_never_add_transforms() {
    let width = 32;
    let height = 32;
    let plane = create_textured_plane(width, height);

    let mut previous = usize::MAX;
    for threshold in [1, 25, 100, 400, 2000] {
        let image = PlanarImage::from_luma(width, height, plane.clone()).unwrap();
        let transforms = Encoder::new().threshold(threshold).encode(&image).unwrap();
        let count = transforms.total_len();
        assert!(
            count <= previous,
            "threshold {} produced {} transforms, more than a stricter setting",
            threshold,
            count
        );
        previous = count;
    }
}

#[test]
fn test_full_symmetry_search_never_splits_more() {
    // The full search scans a superset of the identity-only candidates,
    // so each block's best error can only drop and each node that
    // committed before still commits.
    let width = 32;
    let height = 32;
    let plane = create_textured_plane(width, height);

    let identity_only = Encoder::new()
        .threshold(50)
        .encode(&PlanarImage::from_luma(width, height, plane.clone()).unwrap())
        .unwrap();
    let full = Encoder::new()
        .threshold(50)
        .symmetry_mode(SymmetryMode::Full)
        .encode(&PlanarImage::from_luma(width, height, plane).unwrap())
        .unwrap();

    assert!(
        full.total_len() <= identity_only.total_len(),
        "full search produced {} transforms, identity-only {}",
        full.total_len(),
        identity_only.total_len()
    );
}

#[test]
fn test_presets_order_as_expected() {
    let width = 32;
    let height = 32;
    let plane = create_textured_plane(width, height);
    let make_image = || PlanarImage::from_luma(width, height, plane.clone()).unwrap();

    let default_count = Encoder::new().encode(&make_image()).unwrap().total_len();
    let compressed_count = Encoder::max_compression()
        .encode(&make_image())
        .unwrap()
        .total_len();
    assert!(
        compressed_count <= default_count,
        "max_compression ({}) should not exceed the default ({})",
        compressed_count,
        default_count
    );

    // max_quality pairs a strict threshold with the full symmetry search;
    // compare it against the same threshold without the wider search.
    let strict_count = Encoder::new()
        .threshold(25)
        .encode(&make_image())
        .unwrap()
        .total_len();
    let quality_count = Encoder::max_quality()
        .encode(&make_image())
        .unwrap()
        .total_len();
    assert!(default_count <= strict_count);
    assert!(
        quality_count <= strict_count,
        "max_quality ({}) should not exceed identity-only at the same threshold ({})",
        quality_count,
        strict_count
    );
}

#[test]
fn test_color_models_on_identical_planes() {
    let width = 32;
    let height = 32;
    let plane = create_textured_plane(width, height);
    let planes = vec![plane.clone(), plane.clone(), plane];

    let luma_chroma = Encoder::new()
        .threshold(40)
        .encode(&PlanarImage::from_planes(width, height, planes.clone()).unwrap())
        .unwrap();
    assert_eq!(luma_chroma.channels(), 3);
    // Chroma channels run at double the threshold, so on identical pixel
    // data they can only commit earlier than luma.
    assert!(luma_chroma.channel(1).len() <= luma_chroma.channel(0).len());
    assert_eq!(luma_chroma.channel(1), luma_chroma.channel(2));

    let uniform = Encoder::new()
        .threshold(40)
        .color_model(ColorModel::Uniform)
        .encode(&PlanarImage::from_planes(width, height, planes).unwrap())
        .unwrap();
    assert_eq!(uniform.channels(), 3);
    assert_eq!(uniform.channel(0), luma_chroma.channel(0));
    assert_eq!(uniform.channel(1), uniform.channel(0));
    assert_eq!(uniform.channel(2), uniform.channel(0));
}

#[test]
fn test_output_is_independent_of_worker_count() {
    let width = 64;
    let height = 32;
    let plane = create_textured_plane(width, height);
    let planes = vec![plane.clone(), plane.clone(), plane];

    let single = Encoder::new()
        .threads(1)
        .encode(&PlanarImage::from_planes(width, height, planes.clone()).unwrap())
        .unwrap();
    let several = Encoder::new()
        .threads(4)
        .encode(&PlanarImage::from_planes(width, height, planes.clone()).unwrap())
        .unwrap();
    let global = Encoder::new()
        .encode(&PlanarImage::from_planes(width, height, planes).unwrap())
        .unwrap();

    for channel in 0..3 {
        assert_eq!(single.channel(channel), several.channel(channel));
        assert_eq!(single.channel(channel), global.channel(channel));
    }
}

#[test]
fn test_flat_image_reconstructs_exactly_in_one_pass() {
    let width = 32;
    let height = 32;
    let value = 137u8;
    let plane = create_flat_plane(width, height, value);
    let image = PlanarImage::from_luma(width, height, plane.clone()).unwrap();
    let transforms = Encoder::new().encode(&image).unwrap();

    // Flat blocks match with scale zero, so a single application against
    // any starting plane already lands on the exact pixels.
    let start = vec![0u8; (width / 2) * (height / 2)];
    let mut decoded = vec![0u8; width * height];
    for t in transforms.channel(0) {
        t.apply(&start, width / 2, &mut decoded, width);
    }
    assert_eq!(decoded, plane);
}

#[test]
fn test_encode_rejects_unaligned_dimensions() {
    for (width, height) in [(48, 32), (32, 48), (16, 16)] {
        let image = PlanarImage::from_luma(width, height, vec![128; width * height]).unwrap();
        let result = Encoder::new().encode(&image);
        assert!(
            matches!(result, Err(Error::InvalidDimensions { .. })),
            "{}x{} must be rejected",
            width,
            height
        );
    }
}

#[test]
fn test_planar_image_validates_its_planes() {
    assert!(matches!(
        PlanarImage::from_planes(0, 32, vec![Vec::new()]),
        Err(Error::InvalidDimensions { .. })
    ));
    assert!(matches!(
        PlanarImage::from_planes(32, 32, vec![vec![0; 32 * 32]; 2]),
        Err(Error::InvalidChannelCount { channels: 2 })
    ));
    assert!(matches!(
        PlanarImage::from_planes(32, 32, vec![vec![0; 10]]),
        Err(Error::InvalidPixelData { .. })
    ));
}

struct TwoChannelSource;

impl ImageSource for TwoChannelSource {
    fn width(&self) -> usize {
        32
    }
    fn height(&self) -> usize {
        32
    }
    fn channels(&self) -> usize {
        2
    }
    fn read_channel(&self, _channel: usize, out: &mut [u8]) {
        out.fill(0);
    }
}

#[test]
fn test_encode_rejects_unsupported_channel_counts() {
    assert!(matches!(
        Encoder::new().encode(&TwoChannelSource),
        Err(Error::InvalidChannelCount { channels: 2 })
    ));
}
