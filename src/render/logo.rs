use super::RenderWarning;
use crate::common::function_mask::{format_positions, version_positions};
use crate::common::tables::{ec_block_info, total_codewords};
use crate::common::{EcBlockInfo, FunctionMask};
use crate::models::{BitMatrix, Logo, QrSymbol, Version};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Where the logo landed, in output pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Scaled width
    pub width: u32,
    /// Scaled height
    pub height: u32,
}

/// Scale the logo, blend it over the centre of `canvas` and report coverage.
///
/// `origin` is the pixel offset of module (0, 0) and `ppm` the module size.
pub(crate) fn composite(
    canvas: &mut RgbaImage,
    symbol: &QrSymbol,
    logo: &Logo,
    origin: u32,
    ppm: u32,
    threshold: f32,
    warnings: &mut Vec<RenderWarning>,
) -> Option<LogoPlacement> {
    let (src_w, src_h) = logo.image.dimensions();
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let scale = logo.clamped_scale();
    if (scale - logo.scale).abs() > f32::EPSILON {
        warnings.push(RenderWarning::LogoScaleClamped {
            requested: logo.scale,
            applied: scale,
        });
    }

    let symbol_px = symbol.size() as u32 * ppm;
    let longest = ((symbol_px as f32 * scale).round() as u32).max(1);
    let (width, height) = if src_w >= src_h {
        (longest, ((longest as u64 * src_h as u64) / src_w as u64).max(1) as u32)
    } else {
        (((longest as u64 * src_w as u64) / src_h as u64).max(1) as u32, longest)
    };
    let scaled = imageops::resize(&logo.image, width, height, FilterType::Triangle);

    let placement = LogoPlacement {
        x: origin + (symbol_px - width) / 2,
        y: origin + (symbol_px - height) / 2,
        width,
        height,
    };
    imageops::overlay(canvas, &scaled, placement.x as i64, placement.y as i64);

    let damage = LogoDamage::measure(symbol, &scaled, placement, origin, ppm);
    let overloaded = damage.worst_block > damage.correctable;
    if damage.coverage > threshold || overloaded {
        warnings.push(RenderWarning::LogoCoverageExceeded {
            coverage: damage.coverage,
            threshold,
            worst_block: damage.worst_block,
            correctable: damage.correctable,
        });
    }
    if damage.hides_patterns {
        warnings.push(RenderWarning::LogoHidesPatterns);
    }
    if overlaps_finder(symbol.size(), placement, origin, ppm) {
        warnings.push(RenderWarning::LogoOverlapsFinder);
    }
    Some(placement)
}

/// What an opaque logo takes away from the reader
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LogoDamage {
    /// Fraction of data modules touched by the logo
    pub coverage: f32,
    /// Most damaged codewords in any one RS block
    pub worst_block: usize,
    /// Codewords one block can correct
    pub correctable: usize,
    /// Timing, bottom-right alignment, or every copy of format or version bits is hidden
    pub hides_patterns: bool,
}

impl LogoDamage {
    fn measure(
        symbol: &QrSymbol,
        scaled: &RgbaImage,
        placement: LogoPlacement,
        origin: u32,
        ppm: u32,
    ) -> Self {
        let covered = covered_modules(symbol.size(), scaled, placement, origin, ppm);
        Self::from_covered(symbol, &covered)
    }

    // Any codeword with a covered bit counts as lost
    fn from_covered(symbol: &QrSymbol, covered: &BitMatrix) -> Self {
        let version = symbol.version();
        let info = ec_block_info(version, symbol.ec_level());
        let func = FunctionMask::new(version);
        let order = func.zigzag();

        let covered_data = order.iter().filter(|&&(x, y)| covered.get(x, y)).count();
        let coverage = if order.is_empty() {
            0.0
        } else {
            covered_data as f32 / func.data_modules_count() as f32
        };

        let owners = codeword_blocks(info);
        let mut damaged = vec![0usize; info.num_blocks];
        for (k, bits) in order.chunks_exact(8).enumerate().take(total_codewords(version)) {
            if bits.iter().any(|&(x, y)| covered.get(x, y)) {
                damaged[owners[k]] += 1;
            }
        }

        Self {
            coverage,
            worst_block: damaged.iter().copied().max().unwrap_or(0),
            correctable: info.correctable_per_block(),
            hides_patterns: hides_patterns(version, covered),
        }
    }
}

// Block index of each interleaved codeword: data columns first (short blocks drop out
// of the last one), then EC columns
fn codeword_blocks(info: EcBlockInfo) -> Vec<usize> {
    let mut owners = Vec::new();
    for column in 0..=info.short_block_data {
        owners.extend((0..info.num_blocks).filter(|&b| column < info.data_len(b)));
    }
    for _ in 0..info.ecc_per_block {
        owners.extend(0..info.num_blocks);
    }
    owners
}

fn hides_patterns(version: Version, covered: &BitMatrix) -> bool {
    let size = version.size();
    let timing = (8..size - 8).any(|i| covered.get(i, 6) || covered.get(6, i));
    let alignment = version.number() >= 2 && {
        let c = size - 7;
        (c - 2..=c + 2).any(|y| (c - 2..=c + 2).any(|x| covered.get(x, y)))
    };
    // A copy survives with up to three hidden bits
    let lost = |copy: &[(usize, usize)]| {
        copy.iter().filter(|&&(x, y)| covered.get(x, y)).count() > 3
    };
    let format = format_positions(size).iter().all(|copy| lost(&copy[..]));
    let version_bits =
        version.number() >= 7 && version_positions(size).iter().all(|block| lost(&block[..]));
    timing || alignment || format || version_bits
}

// Modules with at least one non-transparent logo pixel inside them
fn covered_modules(
    size: usize,
    scaled: &RgbaImage,
    placement: LogoPlacement,
    origin: u32,
    ppm: u32,
) -> BitMatrix {
    let mut covered = BitMatrix::new(size, size);
    for y in 0..size {
        for x in 0..size {
            let x0 = (origin + x as u32 * ppm).max(placement.x);
            let y0 = (origin + y as u32 * ppm).max(placement.y);
            let x1 = (origin + (x as u32 + 1) * ppm).min(placement.x + placement.width);
            let y1 = (origin + (y as u32 + 1) * ppm).min(placement.y + placement.height);
            if x0 >= x1 || y0 >= y1 {
                continue;
            }
            let opaque = (y0..y1).any(|py| {
                (x0..x1).any(|px| scaled.get_pixel(px - placement.x, py - placement.y)[3] > 0)
            });
            if opaque {
                covered.set(x, y, true);
            }
        }
    }
    covered
}

fn overlaps_finder(size: usize, placement: LogoPlacement, origin: u32, ppm: u32) -> bool {
    let size = size as u32;
    // Finder squares including separators, in module units
    let finders = [(0, 0), (size - 8, 0), (0, size - 8)];
    let (lx0, ly0) = (placement.x, placement.y);
    let (lx1, ly1) = (lx0 + placement.width, ly0 + placement.height);
    finders.iter().any(|&(mx, my)| {
        let fx0 = origin + mx * ppm;
        let fy0 = origin + my * ppm;
        let (fx1, fy1) = (fx0 + 8 * ppm, fy0 + 8 * ppm);
        lx0 < fx1 && fx0 < lx1 && ly0 < fy1 && fy0 < ly1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::models::{ECLevel, EncodingRequest};

    fn symbol(text: &str, level: ECLevel) -> QrSymbol {
        encode(&EncodingRequest::new(text).with_ec_level(level)).unwrap()
    }

    #[test]
    fn test_codeword_blocks_follow_interleave() {
        // 5-Q: two short blocks of 15, two long of 16, 18 EC each
        let info = EcBlockInfo {
            num_blocks: 4,
            ecc_per_block: 18,
            short_block_data: 15,
            num_short_blocks: 2,
        };
        let owners = codeword_blocks(info);
        assert_eq!(owners.len(), 62 + 4 * 18);
        assert_eq!(&owners[..4], &[0, 1, 2, 3]);
        // Last data column only has the long blocks
        assert_eq!(&owners[60..62], &[2, 3]);
        assert_eq!(&owners[62..66], &[0, 1, 2, 3]);
    }

    #[test]
    fn test_uncovered_symbol_has_no_damage() {
        let sym = symbol("nothing hidden", ECLevel::M);
        let damage = LogoDamage::from_covered(&sym, &BitMatrix::new(sym.size(), sym.size()));
        assert_eq!(damage.coverage, 0.0);
        assert_eq!(damage.worst_block, 0);
        assert!(!damage.hides_patterns);
    }

    #[test]
    fn test_one_module_damages_one_codeword() {
        let sym = symbol("one module", ECLevel::L);
        let (x, y) = FunctionMask::new(sym.version()).zigzag()[0];
        let mut covered = BitMatrix::new(sym.size(), sym.size());
        covered.set(x, y, true);
        let damage = LogoDamage::from_covered(&sym, &covered);
        assert_eq!(damage.worst_block, 1);
        assert!(damage.coverage > 0.0);
    }

    #[test]
    fn test_timing_counts_as_hidden_pattern() {
        let sym = symbol("timing", ECLevel::H);
        let mut covered = BitMatrix::new(sym.size(), sym.size());
        covered.set(10, 6, true);
        assert!(LogoDamage::from_covered(&sym, &covered).hides_patterns);
    }

    #[test]
    fn test_partial_module_overlap_counts() {
        let sym = symbol("edge", ECLevel::M);
        let logo = RgbaImage::from_pixel(3, 3, image::Rgba([0, 0, 0, 255]));
        // Module (10, 10) spans pixels 140..150 with origin 40 and ppm 10
        let placement = LogoPlacement {
            x: 148,
            y: 148,
            width: 3,
            height: 3,
        };
        let covered = covered_modules(sym.size(), &logo, placement, 40, 10);
        assert!(covered.get(10, 10));
        assert!(covered.get(11, 11));
        assert!(!covered.get(9, 9));
    }

    #[test]
    fn test_small_centred_logo_misses_finders() {
        let placement = LogoPlacement {
            x: 40 + 80,
            y: 40 + 80,
            width: 50,
            height: 50,
        };
        assert!(!overlaps_finder(21, placement, 40, 10));
        let big = LogoPlacement {
            x: 40 + 20,
            y: 40 + 20,
            width: 170,
            height: 170,
        };
        assert!(overlaps_finder(21, big, 40, 10));
    }
}
