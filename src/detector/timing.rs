/// Timing pattern validation for located regions
use super::transform::sample_module;
use crate::models::BitMatrix;
use crate::utils::geometry::PerspectiveTransform;

/// Minimum fraction of alternating neighbours along each timing line
pub const MIN_ALTERNATION: f32 = 0.75;

/// Modules of the horizontal (row 6) and vertical (column 6) timing lines between
/// the finder separators
pub fn read_timing_lines(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
) -> Option<(Vec<bool>, Vec<bool>)> {
    if dimension < 21 {
        return None;
    }
    let span = 8..dimension - 8;
    let horizontal = span
        .clone()
        .map(|i| sample_module(binary, transform, i, 6, 0))
        .collect();
    let vertical = span
        .map(|i| sample_module(binary, transform, 6, i, 0))
        .collect();
    Some((horizontal, vertical))
}

/// Fraction of neighbouring modules that differ
pub fn alternation_ratio(bits: &[bool]) -> f32 {
    if bits.len() < 2 {
        return 0.0;
    }
    let transitions = bits.windows(2).filter(|w| w[0] != w[1]).count();
    transitions as f32 / (bits.len() - 1) as f32
}

/// True when both timing lines alternate closely enough for the region to be a symbol
pub fn timing_is_valid(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
) -> bool {
    match read_timing_lines(binary, transform, dimension) {
        Some((h, v)) => {
            alternation_ratio(&h) >= MIN_ALTERNATION && alternation_ratio(&v) >= MIN_ALTERNATION
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternation_ratio() {
        assert_eq!(alternation_ratio(&[true, false, true, false, true]), 1.0);
        assert_eq!(alternation_ratio(&[true, true, true]), 0.0);
        assert_eq!(alternation_ratio(&[true]), 0.0);
        assert_eq!(alternation_ratio(&[true, false, false, true, false]), 0.75);
    }
}
