/// Alphanumeric mode decoder (mode 0010)
/// Character set: 0-9, A-Z, space, $%*+-./:
use super::read_value;

const ALPHANUMERIC_TABLE: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Decode alphanumeric data
/// Pairs = 11 bits, single = 6 bits
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Decode `character_count` characters; returns (bytes, bits_consumed)
    pub fn decode(bits: &[bool], character_count: usize) -> Option<(Vec<u8>, usize)> {
        let mut result = Vec::with_capacity(character_count);
        let mut bit_idx = 0;
        let mut chars_remaining = character_count;

        while chars_remaining >= 2 {
            let value = read_value(bits, bit_idx, 11)? as usize;
            if value >= 45 * 45 {
                return None;
            }
            result.push(ALPHANUMERIC_TABLE[value / 45]);
            result.push(ALPHANUMERIC_TABLE[value % 45]);
            bit_idx += 11;
            chars_remaining -= 2;
        }
        if chars_remaining == 1 {
            let value = read_value(bits, bit_idx, 6)? as usize;
            result.push(*ALPHANUMERIC_TABLE.get(value)?);
            bit_idx += 6;
        }

        Some((result, bit_idx))
    }
}
