/// Byte mode decoder (mode 0100), 8 bits per byte, no text interpretation
use super::read_value;

/// Decoder for raw byte segments
pub struct ByteDecoder;

impl ByteDecoder {
    /// Decode `character_count` bytes; returns (bytes, bits_consumed)
    pub fn decode(bits: &[bool], character_count: usize) -> Option<(Vec<u8>, usize)> {
        let bytes = (0..character_count)
            .map(|i| read_value(bits, i * 8, 8).map(|v| v as u8))
            .collect::<Option<Vec<u8>>>()?;
        Some((bytes, character_count * 8))
    }
}
