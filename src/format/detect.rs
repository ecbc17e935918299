//! Format detection for microscopy container files.
//!
//! CZI files start with a segment header whose id is one of the `ZISRAW*`
//! names, normally `ZISRAWFILE`. Anything else is rejected before the
//! parser goes looking for a file header.

use crate::error::FormatError;
use crate::io::RangeReader;

use super::czi::{SegmentHeader, SegmentId, SEGMENT_HEADER_SIZE};

// =============================================================================
// FileFormat
// =============================================================================

/// Detected container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Carl Zeiss Image container
    Czi,
}

impl FileFormat {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            FileFormat::Czi => "Carl Zeiss CZI",
        }
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Magic id of the file header segment.
const CZI_MAGIC: &[u8] = b"ZISRAWFILE";

/// Detect the format of a file from its first segment header.
///
/// # Returns
/// * `Ok(FileFormat::Czi)` - The first segment carries a CZI segment id
/// * `Err(FormatError::UnsupportedFormat)` - Anything else
pub async fn detect_format<R: RangeReader>(reader: &R) -> Result<FileFormat, FormatError> {
    if reader.size() < SEGMENT_HEADER_SIZE as u64 {
        return Err(FormatError::UnsupportedFormat {
            reason: "File too small to be a CZI file".to_string(),
        });
    }

    let bytes = reader.read_exact_at(0, SEGMENT_HEADER_SIZE).await?;
    if is_czi_header(&bytes) {
        return Ok(FileFormat::Czi);
    }

    // A file may lead with another segment kind (e.g. DELETED) before the
    // file header; accept any known segment id.
    let first = SegmentHeader::parse(&bytes).map_err(|e| FormatError::UnsupportedFormat {
        reason: e.to_string(),
    })?;
    match first.id {
        SegmentId::Unknown(_) => Err(FormatError::UnsupportedFormat {
            reason: "No CZI segment id at start of file".to_string(),
        }),
        _ => Ok(FileFormat::Czi),
    }
}

/// Check if bytes start with the CZI file header segment id.
pub fn is_czi_header(bytes: &[u8]) -> bool {
    if bytes.len() < 16 {
        return false;
    }
    bytes.starts_with(CZI_MAGIC) && bytes[CZI_MAGIC.len()..16].iter().all(|&b| b == 0)
}
