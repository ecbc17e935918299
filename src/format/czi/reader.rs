//! Random-access CZI reader.
//!
//! The reader never loads the whole file. It hops between segment headers
//! through a [`RangeReader`] and pulls only the structures it is asked for.

use bytes::Bytes;
use tracing::{debug, trace};

use super::directory::{SubBlockDirectory, DIRECTORY_HEADER_SIZE};
use super::header::{FileHeader, FILE_HEADER_SIZE};
use super::metadata::{ImageDims, MetadataSegmentHeader, METADATA_HEADER_SIZE};
use super::segment::{SegmentHeader, SegmentId, SEGMENT_HEADER_SIZE};
use super::subblock::SubBlockHeader;
use super::types::PixelType;
use crate::error::CziError;
use crate::io::{read_f32_le, read_u16_le, RangeReader};

// =============================================================================
// Metadata
// =============================================================================

/// The XML metadata segment, verbatim and parsed.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub segment: MetadataSegmentHeader,
    /// XML exactly as stored in the file
    pub raw_xml: Bytes,
    pub dims: ImageDims,
}

impl Metadata {
    pub fn xml(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_xml)
    }
}

// =============================================================================
// SubBlockInfo
// =============================================================================

/// A sub-block found while scanning, with its pixel data location resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SubBlockInfo {
    /// Offset of the segment header
    pub segment_offset: u64,
    pub segment: SegmentHeader,
    pub header: SubBlockHeader,
    /// Offset of the first pixel byte
    pub data_offset: u64,
}

// =============================================================================
// CziReader
// =============================================================================

pub struct CziReader<R> {
    reader: R,
    header_offset: u64,
    header: FileHeader,
}

impl<R: RangeReader> CziReader<R> {
    /// Locate and parse the file header.
    ///
    /// The `ZISRAWFILE` segment is normally first, but the file is scanned
    /// segment by segment until one turns up.
    pub async fn open(reader: R) -> Result<Self, CziError> {
        let mut offset = 0u64;

        while let Some(segment) = read_segment_header(&reader, offset).await? {
            if segment.id == SegmentId::File {
                let body_offset = offset + SEGMENT_HEADER_SIZE as u64;
                let available = reader.size().saturating_sub(body_offset) as usize;
                let bytes = reader
                    .read_exact_at(body_offset, available.min(FILE_HEADER_SIZE))
                    .await?;
                let header = FileHeader::parse(&bytes)?;

                debug!(
                    file = reader.identifier(),
                    major = header.major,
                    minor = header.minor,
                    file_part = header.file_part,
                    metadata_position = header.metadata_position,
                    update_pending = header.update_pending,
                    "Parsed CZI file header"
                );

                return Ok(Self {
                    reader,
                    header_offset: offset,
                    header,
                });
            }

            trace!(offset, id = %segment.id, "Skipping segment while looking for file header");
            offset = segment.next_offset(offset);
        }

        Err(CziError::MissingFileHeader)
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Offset of the `ZISRAWFILE` segment.
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    pub fn inner(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the segment header at `offset`, requiring a particular id.
    async fn expect_segment(
        &self,
        offset: u64,
        expected: SegmentId,
    ) -> Result<SegmentHeader, CziError> {
        let segment = read_segment_header(&self.reader, offset)
            .await?
            .ok_or_else(|| CziError::UnexpectedSegment {
                expected: expected.to_string(),
                found: "end of file".to_string(),
                offset,
            })?;

        if segment.id != expected {
            return Err(CziError::UnexpectedSegment {
                expected: expected.to_string(),
                found: segment.id.to_string(),
                offset,
            });
        }
        Ok(segment)
    }

    /// Read the metadata segment and parse the image dimensions from it.
    pub async fn read_metadata(&self) -> Result<Metadata, CziError> {
        let offset = self.header.metadata_position;
        self.expect_segment(offset, SegmentId::Metadata).await?;

        let part_offset = offset + SEGMENT_HEADER_SIZE as u64;
        let part = self
            .reader
            .read_exact_at(part_offset, METADATA_HEADER_SIZE)
            .await?;
        let segment = MetadataSegmentHeader::parse(&part)?;

        let raw_xml = self
            .reader
            .read_exact_at(
                part_offset + METADATA_HEADER_SIZE as u64,
                segment.xml_size as usize,
            )
            .await?;

        // Files declaring a legacy encoding still parse; odd bytes only ever
        // sit in free text, never in the size or scaling fields.
        let xml = String::from_utf8_lossy(&raw_xml);
        let dims = ImageDims::from_xml(xml.trim_end_matches('\0'))?;

        debug!(
            xml_size = segment.xml_size,
            attachment_size = segment.attachment_size,
            size_x = dims.size_x,
            size_y = dims.size_y,
            size_z = dims.size_z,
            size_c = dims.size_c,
            pixel_type = %dims.pixel_type,
            "Parsed CZI metadata"
        );

        Ok(Metadata {
            segment,
            raw_xml,
            dims,
        })
    }

    /// Parse the sub-block header of the segment at `segment_offset`.
    pub async fn read_subblock_header(&self, segment_offset: u64) -> Result<SubBlockHeader, CziError> {
        let body = segment_offset + SEGMENT_HEADER_SIZE as u64;
        let probe = self
            .reader
            .read_exact_at(body, SubBlockHeader::PROBE_SIZE)
            .await?;
        let size = SubBlockHeader::required_size(&probe)?;
        let bytes = self.reader.read_exact_at(body, size).await?;
        SubBlockHeader::parse(&bytes)
    }

    /// Walk the file from the start and yield every sub-block segment.
    pub fn subblocks(&self) -> SubBlockScan<'_, R> {
        SubBlockScan {
            czi: self,
            offset: 0,
        }
    }

    /// Collect all sub-blocks found by a full scan.
    pub async fn collect_subblocks(&self) -> Result<Vec<SubBlockInfo>, CziError> {
        let mut scan = self.subblocks();
        let mut blocks = Vec::new();
        while let Some(info) = scan.next().await? {
            blocks.push(info);
        }
        Ok(blocks)
    }

    /// Read one X/Y plane and widen it to `f32`.
    ///
    /// Only the single-channel types are supported: Gray8, Gray16 and
    /// Gray32Float.
    pub async fn read_plane(
        &self,
        info: &SubBlockInfo,
        dims: &ImageDims,
    ) -> Result<Vec<f32>, CziError> {
        let pixel_type = dims.pixel_type;
        let len = dims.plane_bytes().ok_or(CziError::PlaneTooLarge {
            size_x: dims.size_x,
            size_y: dims.size_y,
        })?;
        let raw = self.reader.read_exact_at(info.data_offset, len).await?;
        decode_plane(&raw, pixel_type)
    }

    /// Parse the sub-block directory, if the header points at one.
    pub async fn directory(&self) -> Result<Option<SubBlockDirectory>, CziError> {
        let offset = self.header.directory_position;
        if offset == 0 {
            return Ok(None);
        }

        let segment = self.expect_segment(offset, SegmentId::Directory).await?;
        let body = offset + SEGMENT_HEADER_SIZE as u64;
        let available = self.reader.size().saturating_sub(body);
        let len = segment.used_size.max(DIRECTORY_HEADER_SIZE as u64).min(available);
        let bytes = self.reader.read_exact_at(body, len as usize).await?;

        SubBlockDirectory::parse(&bytes).map(Some)
    }
}

/// Sequential scan over sub-block segments.
pub struct SubBlockScan<'a, R> {
    czi: &'a CziReader<R>,
    offset: u64,
}

impl<'a, R: RangeReader> SubBlockScan<'a, R> {
    /// Advance to the next sub-block. Returns `None` at end of file.
    pub async fn next(&mut self) -> Result<Option<SubBlockInfo>, CziError> {
        while let Some(segment) = read_segment_header(&self.czi.reader, self.offset).await? {
            let segment_offset = self.offset;
            self.offset = segment.next_offset(segment_offset);

            if segment.id != SegmentId::SubBlock {
                trace!(offset = segment_offset, id = %segment.id, "Skipping segment");
                continue;
            }

            let header = self.czi.read_subblock_header(segment_offset).await?;
            if header.entry.file_position != segment_offset as i64 {
                debug!(
                    segment_offset,
                    file_position = header.entry.file_position,
                    "Sub-block FilePosition disagrees with its segment offset"
                );
            }
            let data_offset = header.data_offset(segment_offset);

            return Ok(Some(SubBlockInfo {
                segment_offset,
                segment,
                header,
                data_offset,
            }));
        }
        Ok(None)
    }
}

/// Read a segment header, or `None` when fewer than 32 bytes remain.
async fn read_segment_header<R: RangeReader>(
    reader: &R,
    offset: u64,
) -> Result<Option<SegmentHeader>, CziError> {
    let end = offset.checked_add(SEGMENT_HEADER_SIZE as u64);
    if end.map_or(true, |end| end > reader.size()) {
        return Ok(None);
    }
    let bytes = reader.read_exact_at(offset, SEGMENT_HEADER_SIZE).await?;
    SegmentHeader::parse(&bytes).map(Some)
}

/// Widen raw little-endian pixels to `f32`.
pub fn decode_plane(raw: &[u8], pixel_type: PixelType) -> Result<Vec<f32>, CziError> {
    match pixel_type {
        PixelType::Gray8 => Ok(raw.iter().map(|&v| v as f32).collect()),
        PixelType::Gray16 => Ok(raw
            .chunks_exact(2)
            .map(|b| read_u16_le(b) as f32)
            .collect()),
        PixelType::Gray32Float => Ok(raw.chunks_exact(4).map(read_f32_le).collect()),
        other => Err(CziError::UnsupportedPlaneType(other.to_string())),
    }
}
