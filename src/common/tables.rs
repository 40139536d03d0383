use crate::models::{ECLevel, Version};

/// Block structure for one (version, level) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcBlockInfo {
    /// Number of Reed-Solomon blocks
    pub num_blocks: usize,
    /// EC codewords in every block
    pub ecc_per_block: usize,
    /// Data codewords in a short block (long blocks hold one more)
    pub short_block_data: usize,
    /// How many blocks are short; they come first
    pub num_short_blocks: usize,
}

impl EcBlockInfo {
    /// Data codewords in block `index`
    pub fn data_len(&self, index: usize) -> usize {
        if index < self.num_short_blocks {
            self.short_block_data
        } else {
            self.short_block_data + 1
        }
    }

    /// Codewords each block can correct
    pub fn correctable_per_block(&self) -> usize {
        self.ecc_per_block / 2
    }
}

// Tables from ISO/IEC 18004 (Model 2), table 9.
// Index: [ec_level][version]
const ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

const NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Block layout for a version and level
pub fn ec_block_info(version: Version, ec_level: ECLevel) -> EcBlockInfo {
    let v = version.number() as usize;
    let idx = ec_level.ordinal();
    let ecc_per_block = ECC_CODEWORDS_PER_BLOCK[idx][v] as usize;
    let num_blocks = NUM_ERROR_CORRECTION_BLOCKS[idx][v] as usize;
    let total = total_codewords(version);
    let short_block_total = total / num_blocks;
    EcBlockInfo {
        num_blocks,
        ecc_per_block,
        short_block_data: short_block_total - ecc_per_block,
        num_short_blocks: num_blocks - total % num_blocks,
    }
}

/// Modules available for data and EC bits, after all function patterns
pub fn raw_data_modules(version: Version) -> usize {
    let v = version.number() as usize;
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

/// Total codewords (data + EC); leftover remainder bits are not counted
pub fn total_codewords(version: Version) -> usize {
    raw_data_modules(version) / 8
}

/// Data codewords for a version and level
pub fn data_codewords(version: Version, ec_level: ECLevel) -> usize {
    let info = ec_block_info(version, ec_level);
    total_codewords(version) - info.ecc_per_block * info.num_blocks
}

/// Data capacity in bits
pub fn data_capacity_bits(version: Version, ec_level: ECLevel) -> usize {
    data_codewords(version, ec_level) * 8
}

/// Segment encoding mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Digits 0-9, three per 10 bits
    Numeric,
    /// 45-character set, two per 11 bits
    Alphanumeric,
    /// Raw 8-bit bytes
    Byte,
    /// Shift-JIS double-byte characters, one per 13 bits
    Kanji,
    /// Extended channel interpretation designator
    Eci,
}

impl Mode {
    /// 4-bit mode indicator
    pub fn indicator(&self) -> u32 {
        match self {
            Mode::Numeric => 0x1,
            Mode::Alphanumeric => 0x2,
            Mode::Byte => 0x4,
            Mode::Kanji => 0x8,
            Mode::Eci => 0x7,
        }
    }

    /// Mode for a 4-bit indicator
    pub fn from_indicator(bits: u32) -> Option<Self> {
        match bits {
            0x1 => Some(Mode::Numeric),
            0x2 => Some(Mode::Alphanumeric),
            0x4 => Some(Mode::Byte),
            0x8 => Some(Mode::Kanji),
            0x7 => Some(Mode::Eci),
            _ => None,
        }
    }

    /// Width of the character count field
    pub fn char_count_bits(&self, version: Version) -> usize {
        let class = (version.number() as usize + 7) / 17;
        let widths: [usize; 3] = match self {
            Mode::Numeric => [10, 12, 14],
            Mode::Alphanumeric => [9, 11, 13],
            Mode::Byte => [8, 16, 16],
            Mode::Kanji => [8, 10, 12],
            Mode::Eci => [0, 0, 0],
        };
        widths[class]
    }
}

/// Characters of `mode` that fit in a single segment at (version, level)
pub fn capacity(version: Version, ec_level: ECLevel, mode: Mode) -> usize {
    let header = 4 + mode.char_count_bits(version);
    let bits = data_capacity_bits(version, ec_level).saturating_sub(header);
    let chars = match mode {
        Mode::Numeric => {
            let rem = bits % 10;
            bits / 10 * 3
                + if rem >= 7 {
                    2
                } else if rem >= 4 {
                    1
                } else {
                    0
                }
        }
        Mode::Alphanumeric => bits / 11 * 2 + usize::from(bits % 11 >= 6),
        Mode::Byte => bits / 8,
        Mode::Kanji => bits / 13,
        Mode::Eci => 0,
    };
    let max_count = (1usize << mode.char_count_bits(version)) - 1;
    chars.min(max_count)
}

/// Alignment pattern centre coordinates (row/column values) for a version
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let v = version.number() as usize;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let step = (v * 8 + num_align * 3 + 5) / (num_align * 4 - 4) * 2;
    let mut positions: Vec<usize> = (0..num_align - 1)
        .map(|i| version.size() - 7 - i * step)
        .collect();
    positions.push(6);
    positions.reverse();
    positions
}
