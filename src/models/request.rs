use super::content::Payload;
use super::{ECLevel, MaskPattern, Version};
use serde::{Deserialize, Serialize};

/// Requested symbol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VersionChoice {
    /// Smallest version that fits the payload
    #[default]
    Auto,
    /// Exactly this version
    Fixed(u8),
}

/// Requested mask pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskChoice {
    /// Lowest-penalty mask, ties to the lowest index
    #[default]
    Auto,
    /// Exactly this mask
    Fixed(MaskPattern),
}

/// What to do with spare capacity once the version is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EcPolicy {
    /// Keep the requested level
    #[default]
    Exact,
    /// Raise the level as long as the payload still fits the chosen version
    BoostWhenFree,
}

/// Everything the encoder needs to build one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingRequest {
    /// Serialized payload bytes
    pub payload: Vec<u8>,
    /// Version to use
    pub version: VersionChoice,
    /// Error correction level
    pub ec_level: ECLevel,
    /// Error correction upgrade policy
    pub ec_policy: EcPolicy,
    /// Mask to use
    pub mask: MaskChoice,
    /// Pixels per module when rendered
    pub module_size: u32,
    /// Quiet zone width in modules when rendered
    pub border: u32,
    /// Allow Kanji mode for Shift-JIS double-byte runs
    pub allow_kanji: bool,
}

impl EncodingRequest {
    /// Default module size in pixels
    pub const DEFAULT_MODULE_SIZE: u32 = 10;
    /// Default quiet zone in modules
    pub const DEFAULT_BORDER: u32 = 4;

    /// Request with default settings (auto version, level H, auto mask)
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            version: VersionChoice::Auto,
            ec_level: ECLevel::H,
            ec_policy: EcPolicy::Exact,
            mask: MaskChoice::Auto,
            module_size: Self::DEFAULT_MODULE_SIZE,
            border: Self::DEFAULT_BORDER,
            allow_kanji: false,
        }
    }

    /// Request for the canonical serialization of a typed payload
    pub fn from_content(content: &Payload) -> Self {
        Self::new(content.to_string().into_bytes())
    }

    /// Set the version
    pub fn with_version(mut self, version: VersionChoice) -> Self {
        self.version = version;
        self
    }

    /// Set a fixed version number
    pub fn with_fixed_version(self, version: Version) -> Self {
        self.with_version(VersionChoice::Fixed(version.number()))
    }

    /// Set the error correction level
    pub fn with_ec_level(mut self, ec_level: ECLevel) -> Self {
        self.ec_level = ec_level;
        self
    }

    /// Set the error correction policy
    pub fn with_ec_policy(mut self, policy: EcPolicy) -> Self {
        self.ec_policy = policy;
        self
    }

    /// Set the mask
    pub fn with_mask(mut self, mask: MaskChoice) -> Self {
        self.mask = mask;
        self
    }

    /// Set module size in pixels
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size;
        self
    }

    /// Set quiet zone in modules
    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    /// Enable or disable Kanji mode
    pub fn with_kanji(mut self, allow: bool) -> Self {
        self.allow_kanji = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = EncodingRequest::new("abc");
        assert_eq!(req.payload, b"abc");
        assert_eq!(req.version, VersionChoice::Auto);
        assert_eq!(req.ec_level, ECLevel::H);
        assert_eq!(req.mask, MaskChoice::Auto);
        assert_eq!(req.border, 4);
        assert_eq!(req.module_size, 10);
    }

    #[test]
    fn test_builder_chain() {
        let req = EncodingRequest::new("x")
            .with_version(VersionChoice::Fixed(5))
            .with_ec_level(ECLevel::L)
            .with_mask(MaskChoice::Fixed(MaskPattern::Pattern3));
        assert_eq!(req.version, VersionChoice::Fixed(5));
        assert_eq!(req.ec_level, ECLevel::L);
        assert_eq!(req.mask, MaskChoice::Fixed(MaskPattern::Pattern3));
    }

    #[test]
    fn test_with_fixed_version() {
        let version = Version::new(12).unwrap();
        let req = EncodingRequest::new("x").with_fixed_version(version);
        assert_eq!(req.version, VersionChoice::Fixed(12));
    }

    #[test]
    fn test_from_content() {
        let req = EncodingRequest::from_content(&Payload::Phone("+15551234".into()));
        assert_eq!(req.payload, b"tel:+15551234");
    }
}
