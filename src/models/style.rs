use crate::error::StyleError;
use image::RgbaImage;
use std::fmt;
use std::str::FromStr;

/// Opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// White
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Construct from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` or `#RRGGBB`
    pub fn from_hex(s: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| invalid());
        match hex.len() {
            3 => Ok(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
                Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => Err(invalid()),
        }
    }

    /// Relative luminance in 0.0..=1.0 (BT.601 weights)
    pub fn luminance(&self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }

    /// Linear mix, `t = 0` is self
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// As an opaque RGBA pixel
    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl FromStr for Color {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Direction of a linear gradient across the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientAxis {
    /// Left to right
    Horizontal,
    /// Top to bottom
    Vertical,
    /// Top-left to bottom-right
    #[default]
    Diagonal,
}

/// Gradient geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    /// Along an axis over the symbol's bounding box
    Linear(GradientAxis),
    /// From the centre outwards
    Radial,
}

/// One colour stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in 0.0..=1.0
    pub offset: f32,
    /// Colour at that position
    pub color: Color,
}

/// Gradient applied to dark modules
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    /// Geometry
    pub kind: GradientKind,
    /// Ordered stops
    pub stops: Vec<ColorStop>,
}

impl Gradient {
    /// Two-stop gradient
    pub fn two_stop(kind: GradientKind, start: Color, end: Color) -> Self {
        Self {
            kind,
            stops: vec![
                ColorStop {
                    offset: 0.0,
                    color: start,
                },
                ColorStop {
                    offset: 1.0,
                    color: end,
                },
            ],
        }
    }

    /// Stops must be at least two, inside [0, 1] and non-decreasing
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.stops.len() < 2 {
            return Err(StyleError::InvalidGradient(
                "at least two color stops are required".into(),
            ));
        }
        let mut last = 0.0f32;
        for stop in &self.stops {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(StyleError::InvalidGradient(format!(
                    "stop offset {} outside 0..1",
                    stop.offset
                )));
            }
            if stop.offset < last {
                return Err(StyleError::InvalidGradient(
                    "stop offsets must be non-decreasing".into(),
                ));
            }
            last = stop.offset;
        }
        Ok(())
    }

    /// Colour at position `t` in 0.0..=1.0
    pub fn color_at(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Color::BLACK;
        };
        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                if span <= f32::EPSILON {
                    return b.color;
                }
                return a.color.lerp(&b.color, (t - a.offset) / span);
            }
        }
        self.stops.last().map(|s| s.color).unwrap_or(first.color)
    }
}

/// Image composited over the symbol centre
#[derive(Debug, Clone)]
pub struct Logo {
    /// Logo pixels (alpha respected)
    pub image: RgbaImage,
    /// Longest logo side as a fraction of the symbol side
    pub scale: f32,
}

impl Logo {
    /// Smallest allowed scale
    pub const MIN_SCALE: f32 = 0.05;
    /// Largest allowed scale
    pub const MAX_SCALE: f32 = 0.5;
    /// Scale used when none is given
    pub const DEFAULT_SCALE: f32 = 0.2;

    /// Logo at the default scale
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            scale: Self::DEFAULT_SCALE,
        }
    }

    /// Set the scale (clamped at render time)
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Scale clamped to the safe range
    pub fn clamped_scale(&self) -> f32 {
        if self.scale.is_nan() {
            return Self::DEFAULT_SCALE;
        }
        self.scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
    }
}

/// Visual styling for rendering
#[derive(Debug, Clone)]
pub struct StyleSpec {
    /// Dark module colour (when no gradient)
    pub foreground: Color,
    /// Light module and quiet zone colour
    pub background: Color,
    /// Optional gradient for dark modules
    pub gradient: Option<Gradient>,
    /// Optional centred logo
    pub logo: Option<Logo>,
    /// Honour a quiet zone below four modules instead of clamping it
    pub quiet_zone_override: bool,
    /// Fraction of data modules a logo may cover before a warning; defaults to the
    /// error correction level's recoverable fraction
    pub logo_coverage_threshold: Option<f32>,
}

impl Default for StyleSpec {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: Color::WHITE,
            gradient: None,
            logo: None,
            quiet_zone_override: false,
            logo_coverage_threshold: None,
        }
    }
}

impl StyleSpec {
    /// Plain style with the given colours
    pub fn colors(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background,
            ..Self::default()
        }
    }

    /// Set gradient
    pub fn with_gradient(mut self, gradient: Gradient) -> Self {
        self.gradient = Some(gradient);
        self
    }

    /// Set logo
    pub fn with_logo(mut self, logo: Logo) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Check the style before rendering
    pub fn validate(&self) -> Result<(), StyleError> {
        if let Some(gradient) = &self.gradient {
            gradient.validate()?;
        }
        match self.logo_coverage_threshold {
            Some(threshold) if !(0.0..=1.0).contains(&threshold) => {
                return Err(StyleError::InvalidThreshold(threshold));
            }
            _ => {}
        }
        Ok(())
    }
}
