//! Payload to module matrix
//!
//! The pipeline runs segmentation, version/level resolution, codeword assembly,
//! Reed-Solomon interleaving, matrix placement and masking, in that order.

/// Version/level resolution and codeword assembly
pub mod codewords;
/// Mask application and penalty scoring
pub mod mask;
/// Function patterns, format/version bits and data placement
pub mod placement;
/// Mode segmentation and bit packing
pub mod segment;

use crate::common::FunctionMask;
use crate::error::EncodeError;
use crate::models::{EncodingRequest, MaskChoice, QrSymbol};
use tracing::debug;

pub use codewords::{Resolved, resolve};
pub use mask::penalty_score;
pub use placement::data_module_positions;
pub use segment::{Segment, make_segments};

/// Encode a request into a complete symbol.
///
/// The result is deterministic: the same request always yields the same matrix and mask.
pub fn encode(request: &EncodingRequest) -> Result<QrSymbol, EncodeError> {
    if request.module_size == 0 {
        return Err(EncodeError::InvalidRequest(
            "module size must be at least one pixel".into(),
        ));
    }

    let resolved = resolve(request)?;
    let data = codewords::data_codewords(&resolved);
    let all = codewords::add_ecc_and_interleave(&data, resolved.version, resolved.ec_level);

    let func = FunctionMask::new(resolved.version);
    let mut symbol = QrSymbol::new(resolved.version, resolved.ec_level);
    placement::draw_function_patterns(&mut symbol);
    placement::place_codewords(&mut symbol, &func, &all);

    let mask = match request.mask {
        MaskChoice::Fixed(mask) => mask,
        MaskChoice::Auto => mask::choose_mask(&symbol, &func),
    };
    symbol.set_mask(mask);
    mask::apply_mask(&mut symbol, &func, mask);
    placement::write_format(&mut symbol);

    debug!(
        version = symbol.version().number(),
        ec_level = %symbol.ec_level(),
        mask = mask.index(),
        codewords = all.len(),
        "encoded symbol"
    );
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ECLevel, MaskPattern, Module, VersionChoice};

    #[test]
    fn test_encode_hello_world() {
        let req = EncodingRequest::new("HELLO WORLD").with_ec_level(ECLevel::M);
        let symbol = encode(&req).unwrap();
        assert_eq!(symbol.version().number(), 1);
        assert_eq!(symbol.size(), 21);
        assert_eq!(symbol.ec_level(), ECLevel::M);
        assert!(symbol.is_complete());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let req = EncodingRequest::new("https://example.com/deterministic");
        let a = encode(&req).unwrap();
        let b = encode(&req).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn test_fixed_mask_is_honoured() {
        let req = EncodingRequest::new("mask")
            .with_ec_level(ECLevel::Q)
            .with_mask(MaskChoice::Fixed(MaskPattern::Pattern5));
        let symbol = encode(&req).unwrap();
        assert_eq!(symbol.mask(), MaskPattern::Pattern5);
    }

    #[test]
    fn test_zero_module_size_is_invalid() {
        let req = EncodingRequest::new("x").with_module_size(0);
        assert!(matches!(encode(&req), Err(EncodeError::InvalidRequest(_))));
    }

    #[test]
    fn test_fixed_version_dimensions() {
        let req = EncodingRequest::new("v7")
            .with_version(VersionChoice::Fixed(7))
            .with_ec_level(ECLevel::L);
        let symbol = encode(&req).unwrap();
        assert_eq!(symbol.size(), 45);
        assert!(symbol.rows().all(|row| !row.contains(&Module::Unset)));
    }
}
