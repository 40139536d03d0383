/// Segment reconstruction from corrected data codewords
use super::modes::{
    alphanumeric::AlphanumericDecoder, byte::ByteDecoder, kanji::KanjiDecoder,
    numeric::NumericDecoder,
};
use crate::common::tables::Mode;
use crate::models::Version;

// Mode indicators with no character data of their own
const STRUCTURED_APPEND: u32 = 0x3;
const FNC1_FIRST: u32 = 0x5;
const FNC1_SECOND: u32 = 0x9;

/// Why a data bit stream could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Unknown mode indicator
    UnknownMode(u32),
    /// A segment ran past the end of the data or held an impossible value
    Truncated,
}

/// Parse the segments of a data codeword stream into payload bytes.
///
/// ECI designators are read and skipped; the payload keeps the segment bytes as they
/// were encoded. Stops at the terminator or when fewer than four bits remain.
pub fn decode_segments(data_codewords: &[u8], version: Version) -> Result<Vec<u8>, PayloadError> {
    let bits: Vec<bool> = data_codewords
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 != 0))
        .collect();
    let mut reader = BitReader::new(&bits);
    let mut data = Vec::new();

    while reader.remaining() >= 4 {
        let indicator = reader.read_bits(4).ok_or(PayloadError::Truncated)?;
        match indicator {
            0 => break,
            STRUCTURED_APPEND => {
                // Sequence index, total and parity
                reader.read_bits(16).ok_or(PayloadError::Truncated)?;
            }
            FNC1_FIRST => {}
            FNC1_SECOND => {
                reader.read_bits(8).ok_or(PayloadError::Truncated)?;
            }
            _ => {
                let mode = Mode::from_indicator(indicator).ok_or(PayloadError::UnknownMode(indicator))?;
                if mode == Mode::Eci {
                    read_eci(&mut reader)?;
                    continue;
                }
                let count = reader
                    .read_bits(mode.char_count_bits(version))
                    .ok_or(PayloadError::Truncated)? as usize;
                let rest = reader.rest();
                let decoded = match mode {
                    Mode::Numeric => NumericDecoder::decode(rest, count),
                    Mode::Alphanumeric => AlphanumericDecoder::decode(rest, count),
                    Mode::Byte => ByteDecoder::decode(rest, count),
                    Mode::Kanji => KanjiDecoder::decode(rest, count),
                    Mode::Eci => None,
                };
                let (bytes, used) = decoded.ok_or(PayloadError::Truncated)?;
                reader.advance(used);
                data.extend_from_slice(&bytes);
            }
        }
    }

    Ok(data)
}

// One, two or three byte designator selected by the leading bits
fn read_eci(reader: &mut BitReader<'_>) -> Result<u32, PayloadError> {
    let first = reader.read_bits(8).ok_or(PayloadError::Truncated)?;
    let value = if first & 0x80 == 0 {
        first
    } else if first & 0xC0 == 0x80 {
        ((first & 0x3F) << 8) | reader.read_bits(8).ok_or(PayloadError::Truncated)?
    } else if first & 0xE0 == 0xC0 {
        ((first & 0x1F) << 16) | reader.read_bits(16).ok_or(PayloadError::Truncated)?
    } else {
        return Err(PayloadError::Truncated);
    };
    Ok(value)
}

struct BitReader<'a> {
    bits: &'a [bool],
    idx: usize,
}

impl<'a> BitReader<'a> {
    fn new(bits: &'a [bool]) -> Self {
        Self { bits, idx: 0 }
    }

    fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.idx)
    }

    fn rest(&self) -> &'a [bool] {
        &self.bits[self.idx.min(self.bits.len())..]
    }

    fn advance(&mut self, n: usize) {
        self.idx = (self.idx + n).min(self.bits.len());
    }

    fn read_bits(&mut self, n: usize) -> Option<u32> {
        if self.idx + n > self.bits.len() {
            return None;
        }
        let mut val = 0u32;
        for _ in 0..n {
            val = (val << 1) | (self.bits[self.idx] as u32);
            self.idx += 1;
        }
        Some(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::segment::BitBuffer;

    fn v1() -> Version {
        Version::MIN
    }

    fn stream(build: impl FnOnce(&mut BitBuffer)) -> Vec<u8> {
        let mut bits = BitBuffer::new();
        build(&mut bits);
        bits.to_bytes()
    }

    #[test]
    fn test_byte_segment() {
        let data = stream(|b| {
            b.append_bits(0x4, 4);
            b.append_bits(2, 8);
            b.append_bits(b'H' as u32, 8);
            b.append_bits(b'I' as u32, 8);
            b.append_bits(0, 4);
        });
        assert_eq!(decode_segments(&data, v1()), Ok(b"HI".to_vec()));
    }

    #[test]
    fn test_mixed_segments_with_eci() {
        let data = stream(|b| {
            b.append_bits(0x7, 4);
            b.append_bits(26, 8); // UTF-8 designator
            b.append_bits(0x1, 4);
            b.append_bits(3, 10);
            b.append_bits(123, 10);
            b.append_bits(0x2, 4);
            b.append_bits(2, 9);
            b.append_bits(10 * 45 + 11, 11);
            b.append_bits(0, 4);
        });
        assert_eq!(decode_segments(&data, v1()), Ok(b"123AB".to_vec()));
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decode_segments(&[0x00, 0xEC, 0x11], v1()), Ok(Vec::new()));
    }

    #[test]
    fn test_unknown_mode() {
        assert_eq!(
            decode_segments(&[0x60], v1()),
            Err(PayloadError::UnknownMode(0x6))
        );
    }

    #[test]
    fn test_truncated_segment() {
        // Byte mode announcing 200 bytes in a 3-byte stream
        let data = stream(|b| {
            b.append_bits(0x4, 4);
            b.append_bits(200, 8);
            b.append_bits(0xAB, 8);
        });
        assert_eq!(decode_segments(&data, v1()), Err(PayloadError::Truncated));
    }
}
