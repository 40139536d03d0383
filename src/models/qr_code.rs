use super::Point;
use super::content::ContentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// QR code version (1-40, Model 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u8);

impl Version {
    /// Smallest Model 2 version
    pub const MIN: Version = Version(1);
    /// Largest Model 2 version
    pub const MAX: Version = Version(40);

    /// Create a version, `None` outside 1..=40
    pub fn new(number: u8) -> Option<Self> {
        (1..=40).contains(&number).then_some(Self(number))
    }

    /// Get the version number (1-40)
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Get the size in modules (width = height)
    pub fn size(&self) -> usize {
        4 * self.0 as usize + 17
    }

    /// Version whose symbol is `size` modules wide
    pub fn from_size(size: usize) -> Option<Self> {
        if size < 21 || (size - 17) % 4 != 0 {
            return None;
        }
        Self::new(((size - 17) / 4) as u8)
    }

    /// All versions in ascending order
    pub fn all() -> impl Iterator<Item = Version> {
        (1..=40).map(Version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error correction level, ordered from lowest to highest redundancy
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ECLevel {
    /// Low (~7% recovery capacity)
    L = 0,
    /// Medium (~15% recovery capacity)
    M = 1,
    /// Quartile (~25% recovery capacity)
    Q = 2,
    /// High (~30% recovery capacity)
    #[default]
    H = 3,
}

impl ECLevel {
    /// All levels from lowest to highest redundancy
    pub const ALL: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

    /// Get error correction level from the two format bits (01=L, 00=M, 11=Q, 10=H)
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0b01 => Some(ECLevel::L),
            0b00 => Some(ECLevel::M),
            0b11 => Some(ECLevel::Q),
            0b10 => Some(ECLevel::H),
            _ => None,
        }
    }

    /// The two format bits for this level
    pub fn format_bits(&self) -> u8 {
        match self {
            ECLevel::L => 0b01,
            ECLevel::M => 0b00,
            ECLevel::Q => 0b11,
            ECLevel::H => 0b10,
        }
    }

    /// Table row index (L=0 .. H=3)
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// Approximate fraction of codewords this level can restore
    pub fn recovery_fraction(&self) -> f32 {
        match self {
            ECLevel::L => 0.07,
            ECLevel::M => 0.15,
            ECLevel::Q => 0.25,
            ECLevel::H => 0.30,
        }
    }

    /// Next level up, if any
    pub fn boosted(&self) -> Option<Self> {
        match self {
            ECLevel::L => Some(ECLevel::M),
            ECLevel::M => Some(ECLevel::Q),
            ECLevel::Q => Some(ECLevel::H),
            ECLevel::H => None,
        }
    }

    /// Parse "L", "M", "Q" or "H" (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Some(ECLevel::L),
            "M" => Some(ECLevel::M),
            "Q" => Some(ECLevel::Q),
            "H" => Some(ECLevel::H),
            _ => None,
        }
    }
}

impl fmt::Display for ECLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ECLevel::L => "L",
            ECLevel::M => "M",
            ECLevel::Q => "Q",
            ECLevel::H => "H",
        };
        f.write_str(s)
    }
}

/// Mask pattern (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaskPattern {
    /// (i + j) % 2 == 0
    Pattern0 = 0,
    /// i % 2 == 0
    Pattern1 = 1,
    /// j % 3 == 0
    Pattern2 = 2,
    /// (i + j) % 3 == 0
    Pattern3 = 3,
    /// (i/2 + j/3) % 2 == 0
    Pattern4 = 4,
    /// (i*j)%2 + (i*j)%3 == 0
    Pattern5 = 5,
    /// ((i*j)%2 + (i*j)%3) % 2 == 0
    Pattern6 = 6,
    /// ((i+j)%2 + (i*j)%3) % 2 == 0
    Pattern7 = 7,
}

impl MaskPattern {
    /// All eight patterns in index order
    pub const ALL: [MaskPattern; 8] = [
        MaskPattern::Pattern0,
        MaskPattern::Pattern1,
        MaskPattern::Pattern2,
        MaskPattern::Pattern3,
        MaskPattern::Pattern4,
        MaskPattern::Pattern5,
        MaskPattern::Pattern6,
        MaskPattern::Pattern7,
    ];

    /// Get mask pattern from bits
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get((bits & 0x07) as usize).copied()
    }

    /// Pattern index 0-7
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Check if module at row `i`, column `j` should be flipped
    pub fn is_masked(&self, i: usize, j: usize) -> bool {
        match self {
            MaskPattern::Pattern0 => (i + j) % 2 == 0,
            MaskPattern::Pattern1 => i % 2 == 0,
            MaskPattern::Pattern2 => j % 3 == 0,
            MaskPattern::Pattern3 => (i + j) % 3 == 0,
            MaskPattern::Pattern4 => (i / 2 + j / 3) % 2 == 0,
            MaskPattern::Pattern5 => ((i * j) % 2 + (i * j) % 3) == 0,
            MaskPattern::Pattern6 => (((i * j) % 2) + ((i * j) % 3)) % 2 == 0,
            MaskPattern::Pattern7 => (((i + j) % 2) + ((i * j) % 3)) % 2 == 0,
        }
    }
}

/// How the symbol sits in the source image, judged from the top-left to top-right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Within 45 degrees of upright
    Upright,
    /// Rotated roughly 90 degrees clockwise
    Rotated90,
    /// Upside down
    Rotated180,
    /// Rotated roughly 270 degrees clockwise
    Rotated270,
}

impl Orientation {
    /// Classify the direction of the TL -> TR edge
    pub fn from_edge(top_left: &Point, top_right: &Point) -> Self {
        let angle = (top_right.y - top_left.y)
            .atan2(top_right.x - top_left.x)
            .to_degrees();
        let angle = (angle + 360.0) % 360.0;
        if !(45.0..315.0).contains(&angle) {
            Orientation::Upright
        } else if angle < 135.0 {
            Orientation::Rotated90
        } else if angle < 225.0 {
            Orientation::Rotated180
        } else {
            Orientation::Rotated270
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::Upright => "upright",
            Orientation::Rotated90 => "rotated-90",
            Orientation::Rotated180 => "rotated-180",
            Orientation::Rotated270 => "rotated-270",
        };
        f.write_str(s)
    }
}

/// A decoded QR symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Raw decoded bytes
    pub payload: Vec<u8>,
    /// Payload as text when it is valid UTF-8
    pub text: Option<String>,
    /// Content type inferred from the payload
    pub content_type: ContentKind,
    /// QR code version
    pub version: Version,
    /// Error correction level
    pub ec_level: ECLevel,
    /// Mask pattern used
    pub mask: MaskPattern,
    /// Corner points in image coordinates (TL, TR, BR, BL)
    pub bounds: [Point; 4],
    /// Orientation of the symbol in the image
    pub orientation: Orientation,
    /// Codewords repaired by error correction
    pub corrected_codewords: usize,
    /// Codewords the symbol could have repaired in total
    pub correction_capacity: usize,
    /// 1.0 for a clean read, falling towards 0.0 as correction capacity is used up
    pub quality: f32,
}

impl ScanResult {
    /// Build a result from decoded bytes, filling derived fields
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payload: Vec<u8>,
        version: Version,
        ec_level: ECLevel,
        mask: MaskPattern,
        bounds: [Point; 4],
        corrected_codewords: usize,
        correction_capacity: usize,
    ) -> Self {
        let text = String::from_utf8(payload.clone()).ok();
        let content_type = match &text {
            Some(t) => ContentKind::infer(t),
            None => ContentKind::Binary,
        };
        let quality = if correction_capacity == 0 {
            1.0
        } else {
            1.0 - corrected_codewords as f32 / correction_capacity as f32
        };
        Self {
            payload,
            text,
            content_type,
            version,
            ec_level,
            mask,
            orientation: Orientation::from_edge(&bounds[0], &bounds[1]),
            bounds,
            corrected_codewords,
            correction_capacity,
            quality: quality.clamp(0.0, 1.0),
        }
    }

    /// Payload as lossy text
    pub fn content(&self) -> String {
        match &self.text {
            Some(t) => t.clone(),
            None => String::from_utf8_lossy(&self.payload).into_owned(),
        }
    }
}
