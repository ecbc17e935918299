//! Sub-block directory (`ZISRAWDIRECTORY` segment body).
//!
//! ```text
//! Bytes 0-3  : EntryCount (u32)
//! Bytes 4-127: Reserved
//! Bytes 128..: EntryCount variable-length "DV" directory entries
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use super::subblock::DirectoryEntry;
use super::types::{Compression, PixelType};
use crate::error::CziError;
use crate::io::read_u32_le;

/// Size of the directory header before the first entry.
pub const DIRECTORY_HEADER_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct SubBlockDirectory {
    pub entries: Vec<DirectoryEntry>,
}

/// Aggregate view of a directory, used by `info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectorySummary {
    pub entry_count: usize,
    pub pixel_types: BTreeMap<String, usize>,
    pub compressions: BTreeMap<String, usize>,
    /// Inclusive (min, max) index covered per axis
    pub axis_extents: BTreeMap<String, (i64, i64)>,
}

impl SubBlockDirectory {
    /// Entry count declared by the directory header.
    pub fn entry_count(header: &[u8]) -> Result<usize, CziError> {
        if header.len() < 4 {
            return Err(CziError::Truncated {
                what: "directory header",
                required: 4,
                actual: header.len(),
            });
        }
        Ok(read_u32_le(&header[0..4]) as usize)
    }

    /// Parse the full directory body.
    pub fn parse(bytes: &[u8]) -> Result<Self, CziError> {
        let count = Self::entry_count(bytes)?;
        if bytes.len() < DIRECTORY_HEADER_SIZE {
            return Err(CziError::Truncated {
                what: "directory header",
                required: DIRECTORY_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        // Each entry is at least 32 bytes, so cap the reservation by what
        // the buffer could possibly hold
        let mut entries = Vec::with_capacity(count.min(bytes.len() / 32));
        let mut pos = DIRECTORY_HEADER_SIZE;
        for _ in 0..count {
            let (entry, consumed) = DirectoryEntry::parse(&bytes[pos..])?;
            entries.push(entry);
            pos += consumed;
        }

        Ok(Self { entries })
    }

    pub fn summary(&self) -> DirectorySummary {
        let mut summary = DirectorySummary {
            entry_count: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            *summary
                .pixel_types
                .entry(entry.pixel_type.to_string())
                .or_insert(0) += 1;
            *summary
                .compressions
                .entry(entry.compression.to_string())
                .or_insert(0) += 1;
            for dim in &entry.dimensions {
                let start = i64::from(dim.start);
                let end = start + i64::from(dim.size) - 1;
                summary
                    .axis_extents
                    .entry(dim.dimension.clone())
                    .and_modify(|(lo, hi)| {
                        *lo = (*lo).min(start);
                        *hi = (*hi).max(end);
                    })
                    .or_insert((start, end));
            }
        }

        summary
    }

    /// Entries that skim can point an NHDR at: raw, of the given type.
    pub fn raw_planes(&self, pixel_type: PixelType) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries
            .iter()
            .filter(move |e| e.compression == Compression::Raw && e.pixel_type == pixel_type)
    }
}
