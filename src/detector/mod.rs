//! Symbol location in raster images
//!
//! - Finder pattern detection (the three square markers)
//! - Grouping finders into oriented triads
//! - Alignment pattern search (versions 2+)
//! - Timing pattern validation
//! - Perspective sampling of the module grid

/// Alignment pattern search around the predicted bottom-right pattern
pub mod alignment;
/// Finder pattern detection using 1:1:3:1:1 ratio scanning
pub mod finder;
/// Finder triads and dimension estimates
pub mod grouping;
/// Prepared images, the lazy region iterator and regions
pub mod locate;
/// Timing line checks on candidate grids
pub mod timing;
/// Module grid sampling
pub mod transform;

pub use locate::{Locator, PreparedImage, Region, Regions};
