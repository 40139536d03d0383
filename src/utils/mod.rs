//! Image helpers used by the locator
//!
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization (Otsu, fixed threshold, adaptive mean)
//! - Perspective transforms between module grid and image

/// Otsu, fixed and adaptive thresholding
pub mod binarization;
/// Perspective transforms
pub mod geometry;
/// RGB and RGBA to luminance
pub mod grayscale;
