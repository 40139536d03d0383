//! Rasterize a symbol with colours, gradient and logo
//!
//! Rendering never changes the module matrix. Anything that may hurt decodability is
//! reported as a [`RenderWarning`] and rendering carries on.

/// Gradient colour lookup per module
pub mod gradient;
/// Logo scaling, compositing and coverage estimation
pub mod logo;

use crate::error::RenderError;
use crate::models::{Color, QrSymbol, StyleSpec};
use image::{Rgba, RgbaImage};
use std::fmt;
use tracing::{debug, warn};

pub use logo::LogoPlacement;

/// Smallest quiet zone that scanners are guaranteed to cope with
pub const MIN_QUIET_ZONE: u32 = 4;

/// Largest output side in pixels
pub const MAX_IMAGE_SIDE: u64 = 32_768;

// Luminance difference below which foreground and background are reported as too close
const MIN_CONTRAST: f32 = 0.4;

/// Non-fatal problems found while rendering
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    /// Quiet zone was raised to the minimum
    QuietZoneClamped {
        /// Border that was asked for
        requested: u32,
    },
    /// Quiet zone below the minimum was kept because the style overrides the clamp
    QuietZoneBelowMinimum {
        /// Border that was used
        requested: u32,
    },
    /// Logo scale was outside the supported range
    LogoScaleClamped {
        /// Scale that was asked for
        requested: f32,
        /// Scale that was used
        applied: f32,
    },
    /// Logo hides more than error correction can restore, either by covered fraction
    /// or because some block loses more codewords than it can correct
    LogoCoverageExceeded {
        /// Fraction of data modules under the logo
        coverage: f32,
        /// Coverage fraction allowed by the style
        threshold: f32,
        /// Most codewords touched by the logo in any one block
        worst_block: usize,
        /// Codewords each block can correct
        correctable: usize,
    },
    /// Logo hides timing or alignment modules the locator relies on, or every copy of
    /// the format or version bits
    LogoHidesPatterns,
    /// Logo overlaps a finder pattern
    LogoOverlapsFinder,
    /// Foreground and background luminance are too close
    LowContrast {
        /// Absolute luminance difference
        difference: f32,
    },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::QuietZoneClamped { requested } => write!(
                f,
                "quiet zone of {} modules raised to {}",
                requested, MIN_QUIET_ZONE
            ),
            RenderWarning::QuietZoneBelowMinimum { requested } => write!(
                f,
                "quiet zone of {} modules is below the recommended {}",
                requested, MIN_QUIET_ZONE
            ),
            RenderWarning::LogoScaleClamped { requested, applied } => {
                write!(f, "logo scale {} clamped to {}", requested, applied)
            }
            RenderWarning::LogoCoverageExceeded {
                coverage,
                threshold,
                worst_block,
                correctable,
            } => write!(
                f,
                "logo covers {:.1}% of data modules (limit {:.1}%), up to {} codewords per block (correctable {})",
                coverage * 100.0,
                threshold * 100.0,
                worst_block,
                correctable
            ),
            RenderWarning::LogoHidesPatterns => {
                f.write_str("logo hides modules the reader needs to locate the symbol")
            }
            RenderWarning::LogoOverlapsFinder => f.write_str("logo overlaps a finder pattern"),
            RenderWarning::LowContrast { difference } => {
                write!(f, "low contrast between colours ({:.2})", difference)
            }
        }
    }
}

/// Rendered image plus everything worth telling the caller about it
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The raster
    pub image: RgbaImage,
    /// Problems that did not stop rendering
    pub warnings: Vec<RenderWarning>,
    /// Quiet zone actually used, in modules
    pub border_modules: u32,
    /// Logo position when one was drawn
    pub logo: Option<LogoPlacement>,
}

/// Rasterize `symbol` at `pixels_per_module` with a quiet zone of `border_modules`
pub fn render(
    symbol: &QrSymbol,
    style: &StyleSpec,
    pixels_per_module: u32,
    border_modules: u32,
) -> Result<RenderOutput, RenderError> {
    if pixels_per_module == 0 {
        return Err(RenderError::ZeroModuleSize);
    }
    style.validate()?;

    let mut warnings = Vec::new();
    let border = if border_modules >= MIN_QUIET_ZONE {
        border_modules
    } else if style.quiet_zone_override {
        warnings.push(RenderWarning::QuietZoneBelowMinimum {
            requested: border_modules,
        });
        border_modules
    } else {
        warnings.push(RenderWarning::QuietZoneClamped {
            requested: border_modules,
        });
        MIN_QUIET_ZONE
    };

    let size = symbol.size();
    let side = (size as u64 + 2 * border as u64) * pixels_per_module as u64;
    if side > MAX_IMAGE_SIDE {
        return Err(RenderError::TooLarge(side));
    }

    let difference = contrast(style);
    if difference < MIN_CONTRAST {
        warnings.push(RenderWarning::LowContrast { difference });
    }

    let side = side as u32;
    let mut image = RgbaImage::from_pixel(side, side, style.background.to_rgba());
    let origin = border * pixels_per_module;
    for y in 0..size {
        for x in 0..size {
            if !symbol.is_dark(x, y) {
                continue;
            }
            let color = match &style.gradient {
                Some(g) => gradient::module_color(g, size, x, y),
                None => style.foreground,
            };
            fill_module(
                &mut image,
                origin + x as u32 * pixels_per_module,
                origin + y as u32 * pixels_per_module,
                pixels_per_module,
                color.to_rgba(),
            );
        }
    }

    let logo = match &style.logo {
        Some(logo) => {
            let threshold = style
                .logo_coverage_threshold
                .unwrap_or_else(|| symbol.ec_level().recovery_fraction());
            logo::composite(
                &mut image,
                symbol,
                logo,
                origin,
                pixels_per_module,
                threshold,
                &mut warnings,
            )
        }
        None => None,
    };

    for warning in &warnings {
        warn!(%warning, "render warning");
    }
    debug!(side, border, warnings = warnings.len(), "rendered symbol");

    Ok(RenderOutput {
        image,
        warnings,
        border_modules: border,
        logo,
    })
}

fn fill_module(image: &mut RgbaImage, x0: u32, y0: u32, ppm: u32, pixel: Rgba<u8>) {
    for y in y0..y0 + ppm {
        for x in x0..x0 + ppm {
            image.put_pixel(x, y, pixel);
        }
    }
}

// Worst-case luminance gap between the background and any dark-module colour
fn contrast(style: &StyleSpec) -> f32 {
    let bg = style.background.luminance();
    let gap = |c: &Color| (c.luminance() - bg).abs();
    match &style.gradient {
        Some(g) => g
            .stops
            .iter()
            .map(|s| gap(&s.color))
            .fold(f32::INFINITY, f32::min),
        None => gap(&style.foreground),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::error::StyleError;
    use crate::models::{ECLevel, EncodingRequest, Gradient, GradientKind, Logo};

    fn hello() -> QrSymbol {
        encode(&EncodingRequest::new("HELLO WORLD").with_ec_level(ECLevel::M)).unwrap()
    }

    #[test]
    fn test_plain_render_dimensions_and_colours() {
        let symbol = hello();
        let out = render(&symbol, &StyleSpec::default(), 10, 4).unwrap();
        assert_eq!(out.image.dimensions(), (290, 290));
        assert!(out.warnings.is_empty());
        // Quiet zone is background, finder corner is foreground
        assert_eq!(out.image.get_pixel(5, 5), &Color::WHITE.to_rgba());
        assert_eq!(out.image.get_pixel(40, 40), &Color::BLACK.to_rgba());
        assert_eq!(out.image.get_pixel(49, 49), &Color::BLACK.to_rgba());
    }

    #[test]
    fn test_zero_module_size() {
        let err = render(&hello(), &StyleSpec::default(), 0, 4).unwrap_err();
        assert_eq!(err, RenderError::ZeroModuleSize);
    }

    #[test]
    fn test_quiet_zone_clamp_and_override() {
        let symbol = hello();
        let out = render(&symbol, &StyleSpec::default(), 2, 1).unwrap();
        assert_eq!(out.border_modules, 4);
        assert_eq!(out.image.width(), (21 + 8) * 2);
        assert_eq!(
            out.warnings,
            vec![RenderWarning::QuietZoneClamped { requested: 1 }]
        );

        let style = StyleSpec {
            quiet_zone_override: true,
            ..StyleSpec::default()
        };
        let out = render(&symbol, &style, 2, 1).unwrap();
        assert_eq!(out.border_modules, 1);
        assert_eq!(out.image.width(), (21 + 2) * 2);
        assert_eq!(
            out.warnings,
            vec![RenderWarning::QuietZoneBelowMinimum { requested: 1 }]
        );
    }

    #[test]
    fn test_low_contrast_warning() {
        let style = StyleSpec::colors(Color::rgb(0x77, 0x77, 0x77), Color::rgb(0x88, 0x88, 0x88));
        let out = render(&hello(), &style, 1, 4).unwrap();
        assert!(
            out.warnings
                .iter()
                .any(|w| matches!(w, RenderWarning::LowContrast { .. }))
        );
    }

    #[test]
    fn test_invalid_gradient_rejected() {
        let mut gradient = Gradient::two_stop(GradientKind::Radial, Color::BLACK, Color::WHITE);
        gradient.stops.truncate(1);
        let style = StyleSpec::default().with_gradient(gradient);
        assert!(matches!(
            render(&hello(), &style, 4, 4),
            Err(RenderError::Style(StyleError::InvalidGradient(_)))
        ));
    }

    #[test]
    fn test_gradient_leaves_background_untouched() {
        let gradient = Gradient::two_stop(
            GradientKind::Linear(crate::models::GradientAxis::Horizontal),
            Color::rgb(0, 0, 80),
            Color::rgb(80, 0, 0),
        );
        let style = StyleSpec::default().with_gradient(gradient);
        let out = render(&hello(), &style, 4, 4).unwrap();
        assert_eq!(out.image.get_pixel(0, 0), &Color::WHITE.to_rgba());
        let left = out.image.get_pixel(16, 16);
        let right = out.image.get_pixel(16 + 20 * 4, 16);
        assert!(left[2] > left[0]);
        assert!(right[0] > right[2]);
    }

    #[test]
    fn test_logo_warnings() {
        let symbol = hello();
        let opaque = RgbaImage::from_pixel(8, 8, Rgba([200, 30, 30, 255]));
        let style = StyleSpec {
            logo_coverage_threshold: Some(0.01),
            ..StyleSpec::default().with_logo(Logo::new(opaque.clone()).with_scale(0.9))
        };
        let out = render(&symbol, &style, 10, 4).unwrap();
        assert!(out.warnings.contains(&RenderWarning::LogoScaleClamped {
            requested: 0.9,
            applied: 0.5
        }));
        assert!(
            out.warnings
                .iter()
                .any(|w| matches!(w, RenderWarning::LogoCoverageExceeded { .. }))
        );
        assert!(out.warnings.contains(&RenderWarning::LogoOverlapsFinder));
        let placement = out.logo.unwrap();
        assert_eq!(placement.width, 105);
        // Logo centre pixel is the logo colour
        let c = out.image.get_pixel(145, 145);
        assert!(c[0].abs_diff(200) <= 2 && c[1].abs_diff(30) <= 2 && c[2].abs_diff(30) <= 2);

        let clear = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let style = StyleSpec::default().with_logo(Logo::new(clear));
        let out = render(&symbol, &style, 10, 4).unwrap();
        assert!(out.warnings.is_empty());
    }
}
