//! Read-only description of a CZI file for the `info` command.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use crate::error::SkimError;
use crate::format::czi::{
    CziReader, DirectorySummary, FileHeader, ImageDims, MetadataSegmentHeader, SubBlockDirectory,
};
use crate::io::{CacheStats, RangeReader};

/// Everything `info` reports about a file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub file: String,
    pub size: u64,
    pub format: &'static str,
    pub header_offset: u64,
    pub header: FileHeader,
    pub metadata: MetadataSegmentHeader,
    pub dims: ImageDims,

    /// Summary of the sub-blocks found by scanning segments
    pub subblocks: DirectorySummary,

    /// Sub-blocks an NHDR can point at (raw, matching the XML pixel type)
    pub raw_planes: usize,

    /// Summary of the directory segment, when the file has one
    pub directory: Option<DirectorySummary>,

    pub cache: Option<CacheStats>,
}

impl FileInfo {
    /// Gather header, metadata and sub-block statistics.
    pub async fn collect<R: RangeReader>(czi: &CziReader<R>) -> Result<Self, SkimError> {
        let reader = czi.inner();
        let metadata = czi.read_metadata().await?;
        let dims = metadata.dims;

        let scanned = SubBlockDirectory {
            entries: czi
                .collect_subblocks()
                .await?
                .into_iter()
                .map(|info| info.header.entry)
                .collect(),
        };
        let raw_planes = scanned.raw_planes(dims.pixel_type).count();
        debug!(
            subblocks = scanned.entries.len(),
            raw_planes, "Scanned sub-blocks"
        );

        let directory = czi.directory().await?.map(|d| d.summary());

        Ok(Self {
            file: reader.identifier().to_string(),
            size: reader.size(),
            format: crate::format::FileFormat::Czi.name(),
            header_offset: czi.header_offset(),
            header: czi.header().clone(),
            metadata: metadata.segment,
            dims,
            subblocks: scanned.summary(),
            raw_planes,
            directory,
            cache: None,
        })
    }

    /// Human-readable report in labelled sections.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let h = &self.header;
        let d = &self.dims;

        let _ = writeln!(out, "==========FILE============");
        let _ = writeln!(out, "Path       : {}", self.file);
        let _ = writeln!(out, "Size       : {} bytes", self.size);
        let _ = writeln!(out, "Format     : {}", self.format);
        let _ = writeln!(out);

        let _ = writeln!(out, "==========HEADER==========");
        let _ = writeln!(out, "Offset     : {}", self.header_offset);
        let _ = writeln!(out, "Major      : {}", h.major);
        let _ = writeln!(out, "Minor      : {}", h.minor);
        let _ = writeln!(out, "FileGuid   : {}", h.file_guid);
        let _ = writeln!(out, "FilePart   : {}", h.file_part);
        let _ = writeln!(out, "DirPos     : {}", h.directory_position);
        let _ = writeln!(out, "MetaDataPos: {}", h.metadata_position);
        let _ = writeln!(out, "AttDirPos  : {}", h.attachment_directory_position);
        let _ = writeln!(out, "UpdatePend : {}", h.update_pending);
        let _ = writeln!(out);

        let _ = writeln!(out, "=========METADATA=========");
        let _ = writeln!(out, "XmlSize    : {}", self.metadata.xml_size);
        let _ = writeln!(out, "AttachSize : {}", self.metadata.attachment_size);
        let _ = writeln!(out);

        let _ = writeln!(out, "====IMAGE DIMS from XML===");
        let _ = writeln!(out, "SizeX: {}", d.size_x);
        let _ = writeln!(out, "SizeY: {}", d.size_y);
        let _ = writeln!(out, "SizeZ: {}", d.size_z);
        let _ = writeln!(out, "SizeC: {}", d.size_c);
        let _ = writeln!(out, "SizeT: {}", d.size_t);
        let _ = writeln!(out, "ScalingX: {:.12}", d.scaling_x);
        let _ = writeln!(out, "ScalingY: {:.12}", d.scaling_y);
        let _ = writeln!(out, "ScalingZ: {:.12}", d.scaling_z);
        let _ = writeln!(out, "PixelType: {}", d.pixel_type);
        let _ = writeln!(out);

        let _ = writeln!(out, "========SUBBLOCKS=========");
        write_summary(&mut out, &self.subblocks);
        match d.expected_planes() {
            Some(expected) => {
                let _ = writeln!(out, "Raw planes : {} of {} expected", self.raw_planes, expected);
            }
            None => {
                let _ = writeln!(out, "Raw planes : {} (SizeC*SizeZ overflows)", self.raw_planes);
            }
        }
        let _ = writeln!(out);

        if let Some(ref directory) = self.directory {
            let _ = writeln!(out, "========DIRECTORY=========");
            write_summary(&mut out, directory);
            let _ = writeln!(out);
        }

        if let Some(cache) = self.cache {
            let _ = writeln!(out, "Cache      : {} hits, {} misses", cache.hits, cache.misses);
        }

        out
    }
}

fn write_summary(out: &mut String, summary: &DirectorySummary) {
    let _ = writeln!(out, "Count      : {}", summary.entry_count);
    for (name, count) in &summary.pixel_types {
        let _ = writeln!(out, "PixelType  : {} x{}", name, count);
    }
    for (name, count) in &summary.compressions {
        let _ = writeln!(out, "Compression: {} x{}", name, count);
    }
    for (axis, (lo, hi)) in &summary.axis_extents {
        let _ = writeln!(out, "Axis {:<6}: {}..={}", axis, lo, hi);
    }
}
