//! Reading payloads from located regions
//!
//! - Format and version information (BCH nearest codeword)
//! - Unmasking and zig-zag codeword extraction
//! - De-interleaving and Reed-Solomon correction per block
//! - Segment reconstruction (numeric, alphanumeric, byte, Kanji, ECI)

/// Codeword extraction and block correction
pub mod bitstream;
/// Format and version information
pub mod format;
/// Per-mode segment decoders
pub mod modes;
/// Segment stream parsing
pub mod payload;

use crate::detector::Region;
use crate::error::DecodeError;
use crate::models::{BitMatrix, Point, ScanResult, Version};
use bitstream::{deinterleave_and_correct, read_codewords};
use format::{FormatInfo, VersionRead, extract_version};
use tracing::debug;

enum Attempt {
    Decoded(ScanResult),
    // Version blocks name a different size than the geometry suggested
    Resample(Version),
    Failed(DecodeError),
}

/// Decode the symbol inside a located region.
///
/// All four orientations of the sampled grid are tried. When the version blocks
/// disagree with the estimated size the region is re-gridded once at the decoded size.
pub fn decode(region: &Region<'_>) -> Result<ScanResult, DecodeError> {
    match decode_grid(&region.sample(), region.bounds()) {
        Attempt::Decoded(result) => Ok(result),
        Attempt::Failed(err) => Err(err),
        Attempt::Resample(version) => {
            debug!(
                estimated = region.dimension,
                decoded = version.size(),
                "resampling at decoded version"
            );
            let resized = region
                .with_dimension(version.size())
                .ok_or(DecodeError::MalformedFormatInfo)?;
            match decode_grid(&resized.sample(), resized.bounds()) {
                Attempt::Decoded(result) => Ok(result),
                Attempt::Failed(err) => Err(err),
                Attempt::Resample(_) => Err(DecodeError::MalformedFormatInfo),
            }
        }
    }
}

/// Decode an already sampled module grid whose corners sit at `bounds` (TL, TR, BR, BL)
pub fn decode_matrix(grid: &BitMatrix, bounds: [Point; 4]) -> Result<ScanResult, DecodeError> {
    match decode_grid(grid, bounds) {
        Attempt::Decoded(result) => Ok(result),
        Attempt::Failed(err) => Err(err),
        Attempt::Resample(_) => Err(DecodeError::MalformedFormatInfo),
    }
}

fn decode_grid(grid: &BitMatrix, bounds: [Point; 4]) -> Attempt {
    let mut grid = grid.clone();
    let mut bounds = bounds;
    let mut worst = DecodeError::NotFound;
    for _ in 0..4 {
        match decode_oriented(&grid, bounds) {
            Attempt::Failed(err) => {
                if severity(&err) > severity(&worst) {
                    worst = err;
                }
            }
            done => return done,
        }
        // Clockwise turn: the old bottom-left corner becomes top-left
        grid = grid.rotate90();
        bounds = [bounds[3], bounds[0], bounds[1], bounds[2]];
    }
    Attempt::Failed(worst)
}

fn severity(err: &DecodeError) -> u8 {
    match err {
        DecodeError::Uncorrectable { .. } => 3,
        DecodeError::MalformedFormatInfo => 2,
        DecodeError::Timeout => 1,
        DecodeError::NotFound => 0,
    }
}

fn decode_oriented(grid: &BitMatrix, bounds: [Point; 4]) -> Attempt {
    let Some(version) = Version::from_size(grid.width()) else {
        return Attempt::Failed(DecodeError::NotFound);
    };
    let candidates = FormatInfo::candidates(grid);
    if candidates.is_empty() {
        return Attempt::Failed(DecodeError::MalformedFormatInfo);
    }
    match extract_version(grid) {
        VersionRead::Decoded(read) if read != version => return Attempt::Resample(read),
        VersionRead::Unreadable => return Attempt::Failed(DecodeError::MalformedFormatInfo),
        _ => {}
    }

    let mut failure = DecodeError::MalformedFormatInfo;
    for format in candidates {
        match decode_with_format(grid, version, format, bounds) {
            Ok(result) => return Attempt::Decoded(result),
            Err(err) => {
                debug!(
                    ec_level = %format.ec_level,
                    mask = format.mask_pattern.index(),
                    distance = format.distance,
                    "format candidate rejected"
                );
                failure = err;
            }
        }
    }
    Attempt::Failed(failure)
}

fn decode_with_format(
    grid: &BitMatrix,
    version: Version,
    format: FormatInfo,
    bounds: [Point; 4],
) -> Result<ScanResult, DecodeError> {
    let codewords = read_codewords(grid, version, format.mask_pattern);
    let corrected = deinterleave_and_correct(&codewords, version, format.ec_level)
        .map_err(|block| DecodeError::Uncorrectable { block })?;
    let payload = payload::decode_segments(&corrected.data, version).map_err(|err| {
        debug!(?err, "corrected data is not a valid segment stream");
        DecodeError::Uncorrectable { block: 0 }
    })?;

    debug!(
        version = version.number(),
        ec_level = %format.ec_level,
        mask = format.mask_pattern.index(),
        corrected = corrected.corrected,
        bytes = payload.len(),
        "decoded symbol"
    );
    Ok(ScanResult::new(
        payload,
        version,
        format.ec_level,
        format.mask_pattern,
        bounds,
        corrected.corrected,
        corrected.capacity,
    ))
}
