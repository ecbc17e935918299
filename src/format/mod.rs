//! Format parsers for microscopy container files.
//!
//! # Format Detection
//!
//! Use [`detect::detect_format`] to check a file before parsing it.
//! Currently supported formats:
//!
//! - **Carl Zeiss CZI**: segment-based container identified by `ZISRAW*` ids

pub mod czi;
pub mod detect;

pub use detect::{detect_format, is_czi_header, FileFormat};
