//! Segment body decoders, one per data mode
//!
//! Each decoder takes the bits following a segment's character count and returns
//! the decoded bytes with the number of bits consumed, or `None` when the bits run
//! out or hold a value the mode cannot produce.

/// 45-character alphanumeric mode
pub mod alphanumeric;
/// 8-bit byte mode
pub mod byte;
/// Shift-JIS Kanji mode
pub mod kanji;
/// Numeric mode
pub mod numeric;

pub(crate) fn read_value(bits: &[bool], start: usize, len: usize) -> Option<u32> {
    let slice = bits.get(start..start + len)?;
    Some(slice.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32))
}
