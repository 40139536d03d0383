use crate::common::FunctionMask;
use crate::common::bch::{encode_format, encode_version};
use crate::common::function_mask::{alignment_centers, format_positions, version_positions};
use crate::models::{Module, QrSymbol, Version};

/// Draw finder, separator, timing and alignment patterns plus the dark module.
/// Format and version areas are reserved as light until masking writes them.
pub fn draw_function_patterns(symbol: &mut QrSymbol) {
    let size = symbol.size();

    for i in 0..size {
        symbol.set_dark(6, i, i % 2 == 0);
        symbol.set_dark(i, 6, i % 2 == 0);
    }

    draw_finder(symbol, 3, 3);
    draw_finder(symbol, size - 4, 3);
    draw_finder(symbol, 3, size - 4);

    for (cx, cy) in alignment_centers(symbol.version()) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let dark = dx.abs().max(dy.abs()) != 1;
                symbol.set_dark(
                    (cx as i32 + dx) as usize,
                    (cy as i32 + dy) as usize,
                    dark,
                );
            }
        }
    }

    // Placeholders so no function module stays unset before the real bits arrive
    draw_format_bits(symbol, 0);
    if symbol.version().number() >= 7 {
        draw_version_bits(symbol);
    }
}

// Finder with its separator ring, clipped at the symbol edge
fn draw_finder(symbol: &mut QrSymbol, cx: usize, cy: usize) {
    let size = symbol.size() as i32;
    for dy in -4i32..=4 {
        for dx in -4i32..=4 {
            let x = cx as i32 + dx;
            let y = cy as i32 + dy;
            if (0..size).contains(&x) && (0..size).contains(&y) {
                let dist = dx.abs().max(dy.abs());
                symbol.set_dark(x as usize, y as usize, dist != 2 && dist != 4);
            }
        }
    }
}

/// Write both copies of the 15-bit format word and the dark module
pub fn draw_format_bits(symbol: &mut QrSymbol, format: u16) {
    let size = symbol.size();
    for copy in format_positions(size) {
        for (i, &(x, y)) in copy.iter().enumerate() {
            symbol.set_dark(x, y, (format >> i) & 1 != 0);
        }
    }
    symbol.set(8, size - 8, Module::Dark);
}

/// Write both 6x3 version blocks (versions 7 and up)
pub fn draw_version_bits(symbol: &mut QrSymbol) {
    let bits = encode_version(symbol.version());
    for block in version_positions(symbol.size()) {
        for (i, &(x, y)) in block.iter().enumerate() {
            symbol.set_dark(x, y, (bits >> i) & 1 != 0);
        }
    }
}

/// Write the final format word for the symbol's level and mask
pub fn write_format(symbol: &mut QrSymbol) {
    let format = encode_format(symbol.ec_level(), symbol.mask());
    draw_format_bits(symbol, format);
}

/// Place codeword bits along the zig-zag path; leftover remainder modules are light
pub fn place_codewords(symbol: &mut QrSymbol, func: &FunctionMask, codewords: &[u8]) {
    let total_bits = codewords.len() * 8;
    for (i, (x, y)) in func.zigzag().into_iter().enumerate() {
        let dark = i < total_bits && (codewords[i >> 3] >> (7 - (i & 7))) & 1 != 0;
        symbol.set_dark(x, y, dark);
    }
}

/// Module coordinates (x, y) of each codeword bit in placement order.
///
/// Entry `8 * k + b` holds bit `7 - b` of interleaved codeword `k`; remainder
/// modules past the last full codeword are included at the end.
pub fn data_module_positions(version: Version) -> Vec<(usize, usize)> {
    FunctionMask::new(version).zigzag()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ECLevel, MaskPattern};

    fn v(n: u8) -> Version {
        Version::new(n).unwrap_or(Version::MIN)
    }

    #[test]
    fn test_function_patterns_fill_exactly_the_function_area() {
        for n in [1u8, 2, 7, 21] {
            let mut symbol = QrSymbol::new(v(n), ECLevel::M);
            draw_function_patterns(&mut symbol);
            let func = FunctionMask::new(v(n));
            for y in 0..symbol.size() {
                for x in 0..symbol.size() {
                    assert_eq!(
                        symbol.get(x, y) != Module::Unset,
                        func.is_function(x, y),
                        "v{} ({}, {})",
                        n,
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn test_finder_shape() {
        let mut symbol = QrSymbol::new(v(1), ECLevel::L);
        draw_function_patterns(&mut symbol);
        let row: Vec<bool> = (0..8).map(|x| symbol.is_dark(x, 3)).collect();
        assert_eq!(row, vec![true, false, true, true, true, false, true, false]);
        assert!(symbol.is_dark(8, 13));
    }

    #[test]
    fn test_format_copies_agree() {
        let mut symbol = QrSymbol::new(v(1), ECLevel::Q);
        draw_function_patterns(&mut symbol);
        symbol.set_mask(MaskPattern::Pattern6);
        write_format(&mut symbol);
        let size = symbol.size();
        let first: Vec<bool> = (0..6)
            .map(|i| symbol.is_dark(8, i))
            .chain([symbol.is_dark(8, 7), symbol.is_dark(8, 8), symbol.is_dark(7, 8)])
            .chain((9..15).map(|i| symbol.is_dark(14 - i, 8)))
            .collect();
        let second: Vec<bool> = (0..8)
            .map(|i| symbol.is_dark(size - 1 - i, 8))
            .chain((8..15).map(|i| symbol.is_dark(8, size - 15 + i)))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_positions_cover_codewords() {
        let positions = data_module_positions(v(1));
        assert_eq!(positions.len(), 208);
        assert_eq!(positions[0], (20, 20));
    }
}
