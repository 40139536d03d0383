/// Numeric mode decoder (mode 0001)
/// Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits
use super::read_value;

/// Decoder for digit runs
pub struct NumericDecoder;

impl NumericDecoder {
    /// Decode `character_count` digits as ASCII; returns (bytes, bits_consumed)
    pub fn decode(bits: &[bool], character_count: usize) -> Option<(Vec<u8>, usize)> {
        let mut result = Vec::with_capacity(character_count);
        let mut bit_idx = 0;
        let mut chars_remaining = character_count;

        while chars_remaining > 0 {
            let group_size = chars_remaining.min(3);
            let (bits_needed, limit) = match group_size {
                3 => (10, 1000),
                2 => (7, 100),
                _ => (4, 10),
            };
            let value = read_value(bits, bit_idx, bits_needed)?;
            if value >= limit {
                return None;
            }
            let digits = format!("{:0width$}", value, width = group_size);
            result.extend_from_slice(digits.as_bytes());
            bit_idx += bits_needed;
            chars_remaining -= group_size;
        }

        Some((result, bit_idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(value: u32, len: usize) -> Vec<bool> {
        (0..len).rev().map(|i| (value >> i) & 1 != 0).collect()
    }

    #[test]
    fn test_numeric_decode() {
        // "0123" = 012 (10 bits) + 3 (4 bits)
        let mut bits = bits_of(12, 10);
        bits.extend(bits_of(3, 4));
        let (decoded, bits_used) = NumericDecoder::decode(&bits, 4).unwrap();
        assert_eq!(decoded, b"0123");
        assert_eq!(bits_used, 14);
    }

    #[test]
    fn test_out_of_range_group_is_rejected() {
        assert!(NumericDecoder::decode(&bits_of(1017, 10), 3).is_none());
        assert!(NumericDecoder::decode(&bits_of(1, 3), 1).is_none());
    }
}
