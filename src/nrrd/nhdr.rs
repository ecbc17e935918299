//! NRRD detached header (`.nhdr`) generation.
//!
//! The header does not copy any pixels. It lists, via `data file: SKIPLIST 2`,
//! the byte offset of every plane inside the CZI file, so NRRD readers load
//! the planes in place. Axes are ordered X Y [C] Z.

use std::fmt::Write as _;

use crate::error::NrrdError;
use crate::format::czi::ImageDims;

/// Meters per micrometer; CZI scaling is stored in meters.
const METERS_PER_MICRON: f64 = 1e-6;

/// One `data file` line: skip `offset` bytes into `file`, then read a plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEntry {
    pub offset: u64,
    pub file: String,
}

impl SkipEntry {
    pub fn new(offset: u64, file: impl Into<String>) -> Self {
        Self {
            offset,
            file: file.into(),
        }
    }
}

/// Everything needed to write the fixed part of the header.
#[derive(Debug, Clone, PartialEq)]
pub struct NhdrHeader {
    pub nrrd_type: &'static str,
    pub size_x: usize,
    pub size_y: usize,
    pub size_c: usize,
    pub size_z: usize,
    /// Voxel spacing in micrometers (x, y, z)
    pub spacing: [f64; 3],
}

impl NhdrHeader {
    /// Build the header description from parsed image dimensions.
    pub fn from_dims(dims: &ImageDims) -> Result<Self, NrrdError> {
        let nrrd_type = dims
            .pixel_type
            .nrrd_type()
            .ok_or_else(|| NrrdError::UnsupportedType(dims.pixel_type.to_string()))?;

        Ok(Self {
            nrrd_type,
            size_x: dims.size_x,
            size_y: dims.size_y,
            size_c: dims.size_c,
            size_z: dims.size_z.max(1),
            spacing: [
                dims.scaling_x / METERS_PER_MICRON,
                dims.scaling_y / METERS_PER_MICRON,
                dims.scaling_z / METERS_PER_MICRON,
            ],
        })
    }

    /// Whether the channel axis is written (two or more channels).
    pub fn has_channel_axis(&self) -> bool {
        self.size_c >= 2
    }

    /// Render the header followed by one line per skip entry.
    pub fn render(&self, entries: &[SkipEntry]) -> String {
        let mut out = String::with_capacity(512 + entries.len() * 48);
        let channels = self.has_channel_axis();

        // Writing into a String cannot fail
        let _ = writeln!(out, "NRRD0006");
        let _ = writeln!(out, "type: {}", self.nrrd_type);
        let _ = writeln!(out, "endian: little");
        // Compressed sub-blocks are rejected before we get here
        let _ = writeln!(out, "encoding: raw");

        if channels {
            let _ = writeln!(out, "dimension: 4");
            let _ = writeln!(
                out,
                "sizes: {} {} {} {}",
                self.size_x, self.size_y, self.size_c, self.size_z
            );
            let _ = writeln!(out, "centers: cell cell none cell");
        } else {
            let _ = writeln!(out, "dimension: 3");
            let _ = writeln!(out, "sizes: {} {} {}", self.size_x, self.size_y, self.size_z);
            let _ = writeln!(out, "centers: cell cell cell");
        }

        let _ = writeln!(out, "space: 3D-right-handed");
        let _ = writeln!(out, "space origin: (0, 0, 0)");
        let _ = writeln!(out, "space units: \"um\" \"um\" \"um\"");
        let _ = writeln!(
            out,
            "space directions: ({:.12}, 0, 0) (0, {:.12}, 0) {}(0, 0, {:.12})",
            self.spacing[0],
            self.spacing[1],
            if channels { "none " } else { "" },
            self.spacing[2]
        );
        let _ = writeln!(out, "data file: SKIPLIST 2");

        for entry in entries {
            let _ = writeln!(out, "{} {}", entry.offset, entry.file);
        }

        out
    }
}
