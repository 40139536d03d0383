/// Typed payloads and their canonical text forms
pub mod content;
/// Bit-packed module and pixel grids
pub mod matrix;
/// 2D points in image space
pub mod point;
/// Versions, EC levels, masks and scan results
pub mod qr_code;
/// Encoding requests and their builder
pub mod request;
/// Colours, gradients and logos
pub mod style;
/// Encoded module matrix
pub mod symbol;

pub use content::{ContentKind, Payload, WifiSecurity};
pub use matrix::BitMatrix;
pub use point::Point;
pub use qr_code::{ECLevel, MaskPattern, Orientation, ScanResult, Version};
pub use request::{EcPolicy, EncodingRequest, MaskChoice, VersionChoice};
pub use style::{Color, ColorStop, Gradient, GradientAxis, GradientKind, Logo, StyleSpec};
pub use symbol::{Module, QrSymbol};
