/// Kanji mode decoder (mode 1000): 13-bit values back to Shift-JIS byte pairs
use super::read_value;

/// Decoder for Shift-JIS double-byte characters
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Decode `character_count` characters to Shift-JIS bytes; returns (bytes, bits_consumed)
    pub fn decode(bits: &[bool], character_count: usize) -> Option<(Vec<u8>, usize)> {
        let mut sjis = Vec::with_capacity(character_count * 2);
        for i in 0..character_count {
            let value = read_value(bits, i * 13, 13)?;
            let mut code = ((value / 0xC0) << 8) | (value % 0xC0);
            code += if code < 0x1F00 { 0x8140 } else { 0xC140 };
            sjis.push((code >> 8) as u8);
            sjis.push((code & 0xFF) as u8);
        }
        Some((sjis, character_count * 13))
    }
}
