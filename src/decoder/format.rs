/// Format and version information from a sampled module grid
use crate::common::bch::{decode_format, decode_version};
use crate::common::function_mask::{format_positions, version_positions};
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

/// Level and mask read from the format bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask
    pub mask_pattern: MaskPattern,
    /// Bit errors corrected in the better copy
    pub distance: u32,
}

impl FormatInfo {
    /// Read both copies and keep the one closest to a valid codeword.
    /// `None` when neither copy is within three bit errors.
    pub fn extract(grid: &BitMatrix) -> Option<Self> {
        Self::candidates(grid).into_iter().next()
    }

    /// Every distinct reading of the two copies, closest codeword first.
    ///
    /// A damaged copy can land on a different valid codeword, so callers that can
    /// verify a reading should try each candidate in turn.
    pub fn candidates(grid: &BitMatrix) -> Vec<Self> {
        let size = grid.width();
        if size < 21 || grid.height() != size {
            return Vec::new();
        }
        let mut found: Vec<Self> = format_positions(size)
            .iter()
            .filter_map(|copy| {
                let bits = copy
                    .iter()
                    .enumerate()
                    .fold(0u16, |acc, (i, &(x, y))| acc | ((grid.get(x, y) as u16) << i));
                decode_format(bits)
            })
            .map(|(ec_level, mask_pattern, distance)| Self {
                ec_level,
                mask_pattern,
                distance,
            })
            .collect();
        found.sort_by_key(|info| info.distance);
        found.dedup_by(|a, b| a.ec_level == b.ec_level && a.mask_pattern == b.mask_pattern);
        found
    }
}

/// Outcome of reading the version blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRead {
    /// Grid is below version 7 and carries no version blocks
    Absent,
    /// A block decoded to this version
    Decoded(Version),
    /// Neither block is within three bit errors of a version codeword
    Unreadable,
}

/// Decode the two 6x3 version blocks of a version 7+ grid
pub fn extract_version(grid: &BitMatrix) -> VersionRead {
    let size = grid.width();
    if size < 45 {
        return VersionRead::Absent;
    }
    version_positions(size)
        .iter()
        .filter_map(|block| {
            let bits = block
                .iter()
                .enumerate()
                .fold(0u32, |acc, (i, &(x, y))| acc | ((grid.get(x, y) as u32) << i));
            decode_version(bits)
        })
        .min_by_key(|&(_, distance)| distance)
        .map_or(VersionRead::Unreadable, |(version, _)| VersionRead::Decoded(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::models::{EncodingRequest, MaskChoice};

    fn grid_for(request: &EncodingRequest) -> BitMatrix {
        encode(request).unwrap().to_bit_matrix()
    }

    #[test]
    fn test_format_round_trip() {
        let req = EncodingRequest::new("format")
            .with_ec_level(ECLevel::Q)
            .with_mask(MaskChoice::Fixed(MaskPattern::Pattern3));
        let info = FormatInfo::extract(&grid_for(&req)).unwrap();
        assert_eq!(info.ec_level, ECLevel::Q);
        assert_eq!(info.mask_pattern, MaskPattern::Pattern3);
        assert_eq!(info.distance, 0);
    }

    #[test]
    fn test_format_survives_damaged_copy() {
        let req = EncodingRequest::new("format").with_ec_level(ECLevel::L);
        let mut grid = grid_for(&req);
        let expected = FormatInfo::extract(&grid).unwrap();
        // Invert the first copy, leave the second intact
        for &(x, y) in &format_positions(21)[0] {
            grid.toggle(x, y);
        }
        let candidates = FormatInfo::candidates(&grid);
        assert!(
            candidates
                .iter()
                .any(|c| c.ec_level == ECLevel::L && c.mask_pattern == expected.mask_pattern),
            "{candidates:?}"
        );
    }

    #[test]
    fn test_agreeing_copies_give_one_candidate() {
        let grid = grid_for(&EncodingRequest::new("same twice"));
        assert_eq!(FormatInfo::candidates(&grid).len(), 1);
    }

    #[test]
    fn test_blank_grid_has_no_format() {
        // All-light reads as 0, which is more than three bits from every masked word
        assert!(FormatInfo::extract(&BitMatrix::new(21, 21)).is_none());
    }

    #[test]
    fn test_version_blocks() {
        let req = EncodingRequest::new("v9").with_fixed_version(Version::new(9).unwrap());
        let grid = grid_for(&req);
        assert_eq!(extract_version(&grid), VersionRead::Decoded(Version::new(9).unwrap()));
        assert_eq!(extract_version(&BitMatrix::new(21, 21)), VersionRead::Absent);
        assert_eq!(extract_version(&BitMatrix::new(45, 45)), VersionRead::Unreadable);
    }
}
