//! Directory entries and sub-block segment headers.
//!
//! # Directory Entry ("DV" schema)
//!
//! ```text
//! Bytes  0-1 : SchemaType ("DV")
//! Bytes  2-5 : PixelType (i32)
//! Bytes  6-13: FilePosition (i64), offset of the sub-block segment
//! Bytes 14-17: FilePart (i32)
//! Bytes 18-21: Compression (i32)
//! Byte  22   : PyramidType
//! Bytes 23-27: Spare
//! Bytes 28-31: DimensionCount (i32)
//! Bytes 32.. : DimensionCount x 20-byte dimension entries
//! ```
//!
//! # Dimension Entry
//!
//! ```text
//! Bytes  0-3 : Dimension ("X", "Y", "C", "Z", "T", ...), NUL padded
//! Bytes  4-7 : Start (i32)
//! Bytes  8-11: Size (i32)
//! Bytes 12-15: StartCoordinate (f32)
//! Bytes 16-19: StoredSize (i32)
//! ```
//!
//! # Sub-Block Segment Body
//!
//! ```text
//! Bytes 0-3  : MetadataSize (u32)
//! Bytes 4-7  : AttachmentSize (u32)
//! Bytes 8-15 : DataSize (u64)
//! Bytes 16.. : Directory entry (as above)
//! Fill up to 256 bytes, then metadata, then pixel data, then attachments
//! ```

use serde::Serialize;

use super::segment::SEGMENT_HEADER_SIZE;
use super::types::{Compression, PixelType, PyramidType};
use crate::error::CziError;
use crate::io::{read_f32_le, read_i32_le, read_i64_le, read_u32_le, read_u64_le};

/// Size of one dimension entry.
pub const DIMENSION_ENTRY_SIZE: usize = 20;

/// Size of the directory entry before its dimension entries.
pub const DIRECTORY_ENTRY_FIXED_SIZE: usize = 32;

/// Size of the sub-block body before its directory entry.
pub const SUBBLOCK_PREFIX_SIZE: usize = 16;

/// The sub-block header part is padded to at least this many bytes.
pub const SUBBLOCK_MIN_HEADER_SIZE: usize = 256;

/// Largest dimension count a directory entry may declare.
pub const MAX_DIMENSIONS: usize = 12;

// =============================================================================
// DimensionEntry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionEntry {
    /// Axis name, e.g. "X" or "Z"
    pub dimension: String,
    pub start: i32,
    pub size: i32,
    pub start_coordinate: f32,
    pub stored_size: i32,
}

impl DimensionEntry {
    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        if bytes.len() < DIMENSION_ENTRY_SIZE {
            return Err(CziError::Truncated {
                what: "dimension entry",
                required: DIMENSION_ENTRY_SIZE,
                actual: bytes.len(),
            });
        }

        let name = &bytes[0..4];
        let end = name.iter().position(|&b| b == 0).unwrap_or(4);

        Ok(Self {
            dimension: String::from_utf8_lossy(&name[..end]).into_owned(),
            start: read_i32_le(&bytes[4..8]),
            size: read_i32_le(&bytes[8..12]),
            start_coordinate: read_f32_le(&bytes[12..16]),
            stored_size: read_i32_le(&bytes[16..20]),
        })
    }

    pub fn to_bytes(&self) -> [u8; DIMENSION_ENTRY_SIZE] {
        let mut out = [0u8; DIMENSION_ENTRY_SIZE];
        let name = self.dimension.as_bytes();
        let len = name.len().min(4);
        out[..len].copy_from_slice(&name[..len]);
        out[4..8].copy_from_slice(&self.start.to_le_bytes());
        out[8..12].copy_from_slice(&self.size.to_le_bytes());
        out[12..16].copy_from_slice(&self.start_coordinate.to_le_bytes());
        out[16..20].copy_from_slice(&self.stored_size.to_le_bytes());
        out
    }
}

// =============================================================================
// DirectoryEntry
// =============================================================================

/// A "DV" directory entry: where a sub-block lives and what it contains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub pixel_type: PixelType,
    /// Raw pixel type code, kept so mismatches can be reported exactly
    pub pixel_type_code: i32,
    pub file_position: i64,
    pub file_part: i32,
    pub compression: Compression,
    pub pyramid_type: PyramidType,
    pub dimensions: Vec<DimensionEntry>,
}

impl DirectoryEntry {
    /// Number of dimension entries declared by a fixed part, validated.
    pub fn dimension_count(fixed: &[u8]) -> Result<usize, CziError> {
        if fixed.len() < DIRECTORY_ENTRY_FIXED_SIZE {
            return Err(CziError::Truncated {
                what: "directory entry",
                required: DIRECTORY_ENTRY_FIXED_SIZE,
                actual: fixed.len(),
            });
        }
        if &fixed[0..2] != b"DV" {
            return Err(CziError::UnsupportedSchema(
                String::from_utf8_lossy(&fixed[0..2]).into_owned(),
            ));
        }
        let count = read_i32_le(&fixed[28..32]);
        if count < 0 || count as usize > MAX_DIMENSIONS {
            return Err(CziError::TooManyDimensions(count));
        }
        Ok(count as usize)
    }

    /// Parse an entry and return it with the number of bytes it occupies.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), CziError> {
        let count = Self::dimension_count(bytes)?;
        let total = Self::encoded_size(count);
        if bytes.len() < total {
            return Err(CziError::Truncated {
                what: "directory entry dimensions",
                required: total,
                actual: bytes.len(),
            });
        }

        let dimensions = bytes[DIRECTORY_ENTRY_FIXED_SIZE..total]
            .chunks_exact(DIMENSION_ENTRY_SIZE)
            .map(DimensionEntry::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let pixel_type_code = read_i32_le(&bytes[2..6]);
        let entry = Self {
            pixel_type: PixelType::from_code(pixel_type_code),
            pixel_type_code,
            file_position: read_i64_le(&bytes[6..14]),
            file_part: read_i32_le(&bytes[14..18]),
            compression: Compression::from_code(read_i32_le(&bytes[18..22])),
            pyramid_type: PyramidType::from_code(bytes[22]),
            dimensions,
        };
        Ok((entry, total))
    }

    /// Bytes taken by an entry with `dimension_count` dimensions.
    #[inline]
    pub const fn encoded_size(dimension_count: usize) -> usize {
        DIRECTORY_ENTRY_FIXED_SIZE + dimension_count * DIMENSION_ENTRY_SIZE
    }

    /// Look up a dimension entry by axis name.
    pub fn dimension(&self, name: &str) -> Option<&DimensionEntry> {
        self.dimensions.iter().find(|d| d.dimension == name)
    }

    /// Channel and slice index of this plane; absent axes count as 0.
    pub fn plane_index(&self) -> (i32, i32) {
        let c = self.dimension("C").map_or(0, |d| d.start);
        let z = self.dimension("Z").map_or(0, |d| d.start);
        (c, z)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; DIRECTORY_ENTRY_FIXED_SIZE];
        out[0..2].copy_from_slice(b"DV");
        out[2..6].copy_from_slice(&self.pixel_type_code.to_le_bytes());
        out[6..14].copy_from_slice(&self.file_position.to_le_bytes());
        out[14..18].copy_from_slice(&self.file_part.to_le_bytes());
        out[18..22].copy_from_slice(&self.compression.code().to_le_bytes());
        out[22] = match self.pyramid_type {
            PyramidType::None => 0,
            PyramidType::SingleSubBlock => 1,
            PyramidType::MultiSubBlock => 2,
            PyramidType::Unknown(code) => code,
        };
        out[28..32].copy_from_slice(&(self.dimensions.len() as i32).to_le_bytes());
        for dim in &self.dimensions {
            out.extend_from_slice(&dim.to_bytes());
        }
        out
    }
}

// =============================================================================
// SubBlockHeader
// =============================================================================

/// Header of a `ZISRAWSUBBLOCK` segment body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubBlockHeader {
    pub metadata_size: u32,
    pub attachment_size: u32,
    pub data_size: u64,
    pub entry: DirectoryEntry,
}

impl SubBlockHeader {
    /// Bytes needed before the dimension count is known.
    pub const PROBE_SIZE: usize = SUBBLOCK_PREFIX_SIZE + DIRECTORY_ENTRY_FIXED_SIZE;

    /// Full size of the header given a probe of [`Self::PROBE_SIZE`] bytes.
    pub fn required_size(probe: &[u8]) -> Result<usize, CziError> {
        if probe.len() < Self::PROBE_SIZE {
            return Err(CziError::Truncated {
                what: "sub-block header",
                required: Self::PROBE_SIZE,
                actual: probe.len(),
            });
        }
        let count = DirectoryEntry::dimension_count(&probe[SUBBLOCK_PREFIX_SIZE..])?;
        Ok(SUBBLOCK_PREFIX_SIZE + DirectoryEntry::encoded_size(count))
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        if bytes.len() < SUBBLOCK_PREFIX_SIZE {
            return Err(CziError::Truncated {
                what: "sub-block header",
                required: SUBBLOCK_PREFIX_SIZE,
                actual: bytes.len(),
            });
        }
        let (entry, _) = DirectoryEntry::parse(&bytes[SUBBLOCK_PREFIX_SIZE..])?;

        Ok(Self {
            metadata_size: read_u32_le(&bytes[0..4]),
            attachment_size: read_u32_le(&bytes[4..8]),
            data_size: read_u64_le(&bytes[8..16]),
            entry,
        })
    }

    /// Size of the header part including fill, before the sub-block metadata.
    pub fn header_part_size(&self) -> usize {
        let used = SUBBLOCK_PREFIX_SIZE + DirectoryEntry::encoded_size(self.entry.dimensions.len());
        used.max(SUBBLOCK_MIN_HEADER_SIZE)
    }

    /// File offset of the first pixel byte for a segment at `segment_offset`.
    pub fn data_offset(&self, segment_offset: u64) -> u64 {
        segment_offset
            + SEGMENT_HEADER_SIZE as u64
            + self.header_part_size() as u64
            + self.metadata_size as u64
    }

    /// Serialize the header part, padded to its full size.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_part_size());
        out.extend_from_slice(&self.metadata_size.to_le_bytes());
        out.extend_from_slice(&self.attachment_size.to_le_bytes());
        out.extend_from_slice(&self.data_size.to_le_bytes());
        out.extend_from_slice(&self.entry.to_bytes());
        out.resize(self.header_part_size(), 0);
        out
    }
}
