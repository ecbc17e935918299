//! File header (`ZISRAWFILE` segment body).
//!
//! ```text
//! Bytes  0-3 : Major version (1)
//! Bytes  4-7 : Minor version (0)
//! Bytes  8-15: Reserved
//! Bytes 16-31: PrimaryFileGuid (master file, part 0)
//! Bytes 32-47: FileGuid (unique per file)
//! Bytes 48-51: FilePart (multi-file scenarios)
//! Bytes 52-59: DirectoryPosition (sub-block directory segment)
//! Bytes 60-67: MetadataPosition (metadata segment)
//! Bytes 68-71: UpdatePending
//! Bytes 72-79: AttachmentDirectoryPosition
//! Bytes 80-511: Padding
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::CziError;
use crate::io::{read_u32_le, read_u64_le};

/// Size of the file header body in bytes.
pub const FILE_HEADER_SIZE: usize = 512;

// =============================================================================
// Guid
// =============================================================================

/// A 16-byte GUID as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub fn is_nil(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Guid {
    /// Registry format; the first three groups are little-endian.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            read_u32_le(&b[0..4]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
            b[8],
            b[9],
            b[10],
            b[11],
            b[12],
            b[13],
            b[14],
            b[15]
        )
    }
}

impl Serialize for Guid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// FileHeader
// =============================================================================

/// Parsed `ZISRAWFILE` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub major: u32,
    pub minor: u32,
    pub primary_file_guid: Guid,
    pub file_guid: Guid,
    pub file_part: u32,
    pub directory_position: u64,
    pub metadata_position: u64,
    pub update_pending: bool,
    pub attachment_directory_position: u64,
}

impl FileHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        // Only the first 80 bytes carry data; the rest is padding
        const USED: usize = 80;
        if bytes.len() < USED {
            return Err(CziError::Truncated {
                what: "file header",
                required: USED,
                actual: bytes.len(),
            });
        }

        let mut primary = [0u8; 16];
        primary.copy_from_slice(&bytes[16..32]);
        let mut file = [0u8; 16];
        file.copy_from_slice(&bytes[32..48]);

        Ok(FileHeader {
            major: read_u32_le(&bytes[0..4]),
            minor: read_u32_le(&bytes[4..8]),
            primary_file_guid: Guid(primary),
            file_guid: Guid(file),
            file_part: read_u32_le(&bytes[48..52]),
            directory_position: read_u64_le(&bytes[52..60]),
            metadata_position: read_u64_le(&bytes[60..68]),
            update_pending: read_u32_le(&bytes[68..72]) != 0,
            attachment_directory_position: read_u64_le(&bytes[72..80]),
        })
    }

    /// Serialize into the 512-byte on-disk body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; FILE_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.major.to_le_bytes());
        out[4..8].copy_from_slice(&self.minor.to_le_bytes());
        out[16..32].copy_from_slice(&self.primary_file_guid.0);
        out[32..48].copy_from_slice(&self.file_guid.0);
        out[48..52].copy_from_slice(&self.file_part.to_le_bytes());
        out[52..60].copy_from_slice(&self.directory_position.to_le_bytes());
        out[60..68].copy_from_slice(&self.metadata_position.to_le_bytes());
        out[68..72].copy_from_slice(&u32::from(self.update_pending).to_le_bytes());
        out[72..80].copy_from_slice(&self.attachment_directory_position.to_le_bytes());
        out
    }
}
