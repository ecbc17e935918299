//! Segment headers.
//!
//! A CZI file is a flat sequence of segments. Every segment starts with the
//! same 32-byte header:
//!
//! ```text
//! Bytes  0-15: Id, ASCII, NUL padded ("ZISRAWFILE", "ZISRAWSUBBLOCK", ...)
//! Bytes 16-23: AllocatedSize (u64), bytes reserved for the segment body
//! Bytes 24-31: UsedSize (u64), bytes of the body actually in use
//! ```
//!
//! The next segment begins `32 + AllocatedSize` bytes after this one.

use std::fmt;

use crate::error::CziError;
use crate::io::read_u64_le;

/// Size of a segment header in bytes.
pub const SEGMENT_HEADER_SIZE: usize = 32;

/// Length of the id field.
const SEGMENT_ID_LEN: usize = 16;

// =============================================================================
// SegmentId
// =============================================================================

/// Known segment kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentId {
    /// "ZISRAWFILE": the file header
    File,
    /// "ZISRAWDIRECTORY": the sub-block directory
    Directory,
    /// "ZISRAWSUBBLOCK": one image plane
    SubBlock,
    /// "ZISRAWMETADATA": the XML metadata
    Metadata,
    /// "ZISRAWATTDIR": the attachment directory
    AttachmentDirectory,
    /// "ZISRAWATTACH": one attachment
    Attachment,
    /// "DELETED": free space
    Deleted,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl SegmentId {
    /// Decode the id field, stopping at the first NUL.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let id = &bytes[..end];
        match id {
            b"ZISRAWFILE" => SegmentId::File,
            b"ZISRAWDIRECTORY" => SegmentId::Directory,
            b"ZISRAWSUBBLOCK" => SegmentId::SubBlock,
            b"ZISRAWMETADATA" => SegmentId::Metadata,
            b"ZISRAWATTDIR" => SegmentId::AttachmentDirectory,
            b"ZISRAWATTACH" => SegmentId::Attachment,
            b"DELETED" => SegmentId::Deleted,
            other => SegmentId::Unknown(String::from_utf8_lossy(other).into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SegmentId::File => "ZISRAWFILE",
            SegmentId::Directory => "ZISRAWDIRECTORY",
            SegmentId::SubBlock => "ZISRAWSUBBLOCK",
            SegmentId::Metadata => "ZISRAWMETADATA",
            SegmentId::AttachmentDirectory => "ZISRAWATTDIR",
            SegmentId::Attachment => "ZISRAWATTACH",
            SegmentId::Deleted => "DELETED",
            SegmentId::Unknown(id) => id,
        }
    }

    /// Encode into the 16-byte NUL padded field. Longer ids are truncated.
    pub fn to_bytes(&self) -> [u8; SEGMENT_ID_LEN] {
        let mut out = [0u8; SEGMENT_ID_LEN];
        let id = self.as_str().as_bytes();
        let len = id.len().min(SEGMENT_ID_LEN);
        out[..len].copy_from_slice(&id[..len]);
        out
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SegmentHeader
// =============================================================================

/// Parsed 32-byte segment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub id: SegmentId,
    pub allocated_size: u64,
    pub used_size: u64,
}

impl SegmentHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        if bytes.len() < SEGMENT_HEADER_SIZE {
            return Err(CziError::Truncated {
                what: "segment header",
                required: SEGMENT_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        Ok(SegmentHeader {
            id: SegmentId::from_bytes(&bytes[..SEGMENT_ID_LEN]),
            allocated_size: read_u64_le(&bytes[16..24]),
            used_size: read_u64_le(&bytes[24..32]),
        })
    }

    /// Offset of the segment following one that starts at `offset`.
    #[inline]
    pub fn next_offset(&self, offset: u64) -> u64 {
        offset
            .saturating_add(SEGMENT_HEADER_SIZE as u64)
            .saturating_add(self.allocated_size)
    }

    /// Serialize back into the 32-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; SEGMENT_HEADER_SIZE] {
        let mut out = [0u8; SEGMENT_HEADER_SIZE];
        out[..SEGMENT_ID_LEN].copy_from_slice(&self.id.to_bytes());
        out[16..24].copy_from_slice(&self.allocated_size.to_le_bytes());
        out[24..32].copy_from_slice(&self.used_size.to_le_bytes());
        out
    }
}
