use qr_toolkit::common::Mode;
use qr_toolkit::common::tables::{capacity, data_codewords, ec_block_info};
use qr_toolkit::decoder::decode_matrix;
use qr_toolkit::encoder::data_module_positions;
use qr_toolkit::models::{
    BitMatrix, ECLevel, EncodingRequest, MaskPattern, Point, StyleSpec, Version,
};
use image::{DynamicImage, Rgba};
use qr_toolkit::{DecodeError, PreparedImage, ScanOptions, encode, render, scan_image};
use std::time::Duration;

const LEVELS: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

fn bounds(size: usize) -> [Point; 4] {
    let s = size as f32;
    [
        Point::new(0.0, 0.0),
        Point::new(s, 0.0),
        Point::new(s, s),
        Point::new(0.0, s),
    ]
}

/// Position of codeword `j` of block `b` in the interleaved stream
fn stream_index(version: Version, level: ECLevel, b: usize, j: usize) -> usize {
    let info = ec_block_info(version, level);
    let total_data = data_codewords(version, level);
    if j < info.short_block_data {
        j * info.num_blocks + b
    } else if j < info.data_len(b) {
        info.short_block_data * info.num_blocks + (b - info.num_short_blocks)
    } else {
        total_data + (j - info.data_len(b)) * info.num_blocks + b
    }
}

fn flip_codeword(grid: &mut BitMatrix, positions: &[(usize, usize)], k: usize) {
    for &(x, y) in &positions[8 * k..8 * k + 8] {
        grid.toggle(x, y);
    }
}

/// Flip `per_block` codewords of every block, spread over data and EC parts
fn corrupt(grid: &mut BitMatrix, version: Version, level: ECLevel, per_block: usize) {
    let info = ec_block_info(version, level);
    let positions = data_module_positions(version);
    for b in 0..info.num_blocks {
        let len = info.data_len(b) + info.ecc_per_block;
        for n in 0..per_block {
            // Even positions first, then odd ones
            let j = if 2 * n < len {
                2 * n
            } else {
                2 * (n - len.div_ceil(2)) + 1
            };
            flip_codeword(grid, &positions, stream_index(version, level, b, j));
        }
    }
}

#[test]
fn capacity_is_monotonic() {
    for version in Version::all() {
        for pair in LEVELS.windows(2) {
            assert!(data_codewords(version, pair[0]) > data_codewords(version, pair[1]));
            for mode in [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji] {
                assert!(
                    capacity(version, pair[0], mode) >= capacity(version, pair[1], mode),
                    "v{version} {mode:?}"
                );
            }
        }
    }
    for level in LEVELS {
        let versions: Vec<Version> = Version::all().collect();
        for pair in versions.windows(2) {
            assert!(data_codewords(pair[0], level) < data_codewords(pair[1], level));
            assert!(capacity(pair[0], level, Mode::Byte) <= capacity(pair[1], level, Mode::Byte));
        }
    }
    assert_eq!(capacity(Version::MIN, ECLevel::M, Mode::Alphanumeric), 20);
    assert_eq!(
        capacity(Version::new(40).unwrap(), ECLevel::L, Mode::Byte),
        2953
    );
}

#[test]
fn corrupted_codewords_within_capacity_are_corrected() {
    let payload = b"error correction guarantee";
    for (number, level) in [(2u8, ECLevel::L), (5, ECLevel::Q), (7, ECLevel::M), (10, ECLevel::H)] {
        let version = Version::new(number).unwrap();
        let request = EncodingRequest::new(payload.to_vec())
            .with_ec_level(level)
            .with_fixed_version(version);
        let symbol = encode(&request).unwrap();
        let info = ec_block_info(version, level);
        let t = info.correctable_per_block();

        let mut grid = symbol.to_bit_matrix();
        corrupt(&mut grid, version, level, t);
        let result = decode_matrix(&grid, bounds(symbol.size())).unwrap();
        assert_eq!(result.payload, payload, "v{number}-{level}");
        assert_eq!(result.corrected_codewords, t * info.num_blocks);
        assert!(result.quality < 0.01);
    }
}

#[test]
fn flipped_pixels_in_rendered_symbol_are_corrected() {
    const PPM: u32 = 4;
    const BORDER: u32 = 4;
    let payload = b"error correction guarantee";
    let options = ScanOptions {
        time_budget: Duration::from_secs(120),
        ..ScanOptions::default()
    };
    for (number, level) in [(2u8, ECLevel::L), (5, ECLevel::Q), (7, ECLevel::M), (10, ECLevel::H)] {
        let version = Version::new(number).unwrap();
        let request = EncodingRequest::new(payload.to_vec())
            .with_ec_level(level)
            .with_fixed_version(version);
        let symbol = encode(&request).unwrap();
        let t = ec_block_info(version, level).correctable_per_block();

        let clean = symbol.to_bit_matrix();
        let mut damaged = clean.clone();
        corrupt(&mut damaged, version, level, t);

        let mut image = render(&symbol, &StyleSpec::default(), PPM, BORDER).unwrap().image;
        for y in 0..symbol.size() {
            for x in 0..symbol.size() {
                if damaged.get(x, y) == clean.get(x, y) {
                    continue;
                }
                let value = if damaged.get(x, y) { 0 } else { 255 };
                let (x0, y0) = ((BORDER + x as u32) * PPM, (BORDER + y as u32) * PPM);
                for py in y0..y0 + PPM {
                    for px in x0..x0 + PPM {
                        image.put_pixel(px, py, Rgba([value, value, value, 255]));
                    }
                }
            }
        }

        let prepared = PreparedImage::from_dynamic(&DynamicImage::ImageRgba8(image));
        let results = scan_image(&prepared, &options).unwrap();
        assert_eq!(results.len(), 1, "v{number}-{level}");
        assert_eq!(results[0].payload, payload, "v{number}-{level}");
    }
}

#[test]
fn corruption_beyond_capacity_never_yields_wrong_payload() {
    let payload = b"beyond the limit";
    let version = Version::new(5).unwrap();
    let request = EncodingRequest::new(payload.to_vec())
        .with_ec_level(ECLevel::Q)
        .with_fixed_version(version);
    let symbol = encode(&request).unwrap();
    let info = ec_block_info(version, ECLevel::Q);

    let mut grid = symbol.to_bit_matrix();
    corrupt(&mut grid, version, ECLevel::Q, info.ecc_per_block);
    match decode_matrix(&grid, bounds(symbol.size())) {
        Ok(result) => assert_eq!(result.payload, payload),
        Err(err) => assert!(matches!(err, DecodeError::Uncorrectable { .. }), "{err:?}"),
    }
}

#[test]
fn auto_mask_is_deterministic() {
    for text in ["deterministic", "0123456789", "HELLO WORLD", "https://example.com"] {
        let request = EncodingRequest::new(text).with_ec_level(ECLevel::Q);
        let first = encode(&request).unwrap();
        for _ in 0..3 {
            let again = encode(&request).unwrap();
            assert_eq!(again.mask(), first.mask());
            assert_eq!(again, first);
        }
    }
}

#[test]
fn fixed_mask_is_honoured() {
    for index in 0..8u8 {
        let mask = MaskPattern::from_bits(index).unwrap();
        let request = EncodingRequest::new("mask")
            .with_mask(qr_toolkit::models::MaskChoice::Fixed(mask));
        let symbol = encode(&request).unwrap();
        assert_eq!(symbol.mask(), mask);
        let result = decode_matrix(&symbol.to_bit_matrix(), bounds(symbol.size())).unwrap();
        assert_eq!(result.mask, mask);
        assert_eq!(result.payload, b"mask");
    }
}
