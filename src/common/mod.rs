//! Symbol structure shared by the encoder and decoder
//!
//! - Capacity and block tables for every (version, level) pair
//! - Reed-Solomon over GF(256) for data blocks
//! - BCH codes for format and version information
//! - The function-module map and zig-zag data order

/// BCH encoding and nearest-codeword decoding for format/version info
pub mod bch;
/// Function module map and data placement order
pub mod function_mask;
/// Reed-Solomon encoder and decoder
pub mod reed_solomon;
/// Capacity, block and alignment tables
pub mod tables;

pub use function_mask::FunctionMask;
pub use tables::{EcBlockInfo, Mode};
