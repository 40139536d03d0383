//! qr_toolkit - QR code generation, scanning and batch processing
//!
//! - [`encoder::encode`] turns a payload into a standards-conformant module matrix
//! - [`render::render`] rasterizes it with colours, gradients and an optional logo
//! - [`detector::Locator`] finds symbols in images and [`decoder::decode`] reads them
//! - [`scanner`] ties location and decoding together for still images and camera frames
//! - [`batch::BatchCoordinator`] runs many encode or decode items on a bounded pool
//!
//! ```no_run
//! use qr_toolkit::{EncodingRequest, ECLevel, StyleSpec};
//!
//! let request = EncodingRequest::new("https://example.com").with_ec_level(ECLevel::M);
//! let symbol = qr_toolkit::encode(&request)?;
//! let output = qr_toolkit::render(&symbol, &StyleSpec::default(), 8, 4)?;
//! let (w, h) = output.image.dimensions();
//! let found = qr_toolkit::detect_rgba(output.image.as_raw(), w as usize, h as usize);
//! assert_eq!(found[0].payload, b"https://example.com");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Concurrent batch encoding and decoding
pub mod batch;
/// Tables and codes shared by the encoder and decoder
pub mod common;
/// TOML configuration with environment overrides
pub mod config;
/// Reading payloads from located symbols
pub mod decoder;
/// Finding symbols in images
pub mod detector;
/// Payload to module matrix
pub mod encoder;
/// Error types for every component
pub mod error;
/// Core data structures (requests, symbols, styles, scan results)
pub mod models;
/// Module matrix to raster image
pub mod render;
/// Whole-image scanning, camera loop and export
pub mod scanner;
/// Batch input files and image discovery for the CLI
pub mod tools;
/// Grayscale, binarization and geometry helpers
pub mod utils;

pub use batch::{BatchCoordinator, BatchMode, BatchReport, ProgressSnapshot, WorkItem};
pub use config::ToolkitConfig;
pub use decoder::decode;
pub use detector::{Locator, PreparedImage, Region};
pub use encoder::encode;
pub use error::{BatchError, DecodeError, EncodeError, ItemError, RenderError, StyleError};
pub use models::{
    BitMatrix, Color, ContentKind, ECLevel, EncodingRequest, MaskPattern, Payload, Point,
    QrSymbol, ScanResult, StyleSpec, Version,
};
pub use render::{RenderOutput, render};
pub use scanner::{ScanOptions, scan_image};

/// Decode every symbol in a packed RGB image with default scan options.
/// Failures are reported as an empty list.
pub fn detect(image: &[u8], width: usize, height: usize) -> Vec<ScanResult> {
    scan_image(&PreparedImage::from_rgb(image, width, height), &ScanOptions::default())
        .unwrap_or_default()
}

/// Like [`detect`] for packed RGBA input
pub fn detect_rgba(image: &[u8], width: usize, height: usize) -> Vec<ScanResult> {
    scan_image(&PreparedImage::from_rgba(image, width, height), &ScanOptions::default())
        .unwrap_or_default()
}

/// Like [`detect`] for 8-bit luma input
pub fn detect_from_grayscale(image: &[u8], width: usize, height: usize) -> Vec<ScanResult> {
    scan_image(
        &PreparedImage::from_luma(image.to_vec(), width, height),
        &ScanOptions::default(),
    )
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_blank_is_empty() {
        let rgb = vec![255u8; 50 * 50 * 3];
        assert!(detect(&rgb, 50, 50).is_empty());
    }

    #[test]
    fn test_detect_grayscale_roundtrip() {
        let symbol = encode(&EncodingRequest::new("lib level")).unwrap();
        let out = render(&symbol, &StyleSpec::default(), 5, 4).unwrap();
        let gray = image::DynamicImage::ImageRgba8(out.image).to_luma8();
        let (w, h) = gray.dimensions();
        let found = detect_from_grayscale(gray.as_raw(), w as usize, h as usize);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload, b"lib level");
    }
}
