//! Image-level scanning: locate every region, decode, de-duplicate
//!
//! `scan_image` is the single-image entry point. `camera` runs the same routine over a
//! pulled frame sequence and `export` writes collected results as CSV.

/// Throttled, de-duplicating scan loop over a frame source
pub mod camera;
/// Tabular export of scan results
pub mod export;

use crate::config::ScanConfig;
use crate::decoder::decode;
use crate::detector::{Locator, PreparedImage};
use crate::error::{DecodeError, ItemError};
use crate::models::ScanResult;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Limits for one image scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOptions {
    /// Wall-clock budget, checked after each candidate region is decoded
    pub time_budget: Duration,
    /// Finder triads tried
    pub max_regions: usize,
    /// Results with lower quality are dropped
    pub min_quality: f32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            time_budget: Duration::from_millis(config.time_budget_ms),
            max_regions: config.max_regions,
            min_quality: config.min_quality,
        }
    }
}

/// Decode every symbol found in the image.
///
/// Results with the same payload are reported once. With nothing decoded the most
/// informative failure is returned: `Uncorrectable`, then `MalformedFormatInfo`, then
/// `NotFound`. An exhausted budget with nothing decoded is `Timeout`.
pub fn scan_image(
    image: &PreparedImage,
    options: &ScanOptions,
) -> Result<Vec<ScanResult>, DecodeError> {
    let started = Instant::now();
    let mut results: Vec<ScanResult> = Vec::new();
    let mut failure = DecodeError::NotFound;

    let mut exhausted = false;

    for region in Locator::new(options.max_regions).locate(image) {
        match decode(&region) {
            Ok(result) => {
                if result.quality < options.min_quality {
                    debug!(quality = result.quality, "dropping low quality read");
                } else if !results.iter().any(|r| r.payload == result.payload) {
                    results.push(result);
                }
            }
            Err(err) => {
                if rank(&err) > rank(&failure) {
                    failure = err;
                }
            }
        }
        if started.elapsed() > options.time_budget {
            debug!(found = results.len(), "scan budget exhausted");
            exhausted = true;
            break;
        }
    }

    match (results.is_empty(), exhausted) {
        (false, _) => Ok(results),
        (true, true) => Err(DecodeError::Timeout),
        (true, false) => Err(failure),
    }
}

fn rank(err: &DecodeError) -> u8 {
    match err {
        DecodeError::Uncorrectable { .. } => 2,
        DecodeError::MalformedFormatInfo => 1,
        _ => 0,
    }
}

/// Load an image file and scan it
pub fn scan_path(path: &Path, options: &ScanOptions) -> Result<Vec<ScanResult>, ItemError> {
    let image = image::open(path)?;
    Ok(scan_image(&PreparedImage::from_dynamic(&image), options)?)
}
