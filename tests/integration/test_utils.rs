//! Test utilities for integration tests.
//!
//! Provides a request-tracking reader and a builder for small synthetic CZI
//! files with configurable planes, pixel types and segment layout.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use czi_skim::error::IoError;
use czi_skim::format::czi::{
    Compression, DimensionEntry, DirectoryEntry, FileHeader, Guid, MetadataSegmentHeader,
    PixelType, PyramidType, SegmentHeader, SegmentId, SubBlockHeader, FILE_HEADER_SIZE,
    SEGMENT_HEADER_SIZE,
};
use czi_skim::io::RangeReader;

// =============================================================================
// Mock Range Reader with Request Tracking
// =============================================================================

/// A mock range reader that tracks all read requests.
pub struct TrackingMockReader {
    data: Bytes,
    identifier: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<(u64, usize)>>>,
}

impl TrackingMockReader {
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(data),
            identifier: identifier.into(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn get_requests(&self) -> Vec<(u64, usize)> {
        self.requests.read().await.clone()
    }
}

impl Clone for TrackingMockReader {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            identifier: self.identifier.clone(),
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl RangeReader for TrackingMockReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push((offset, len));

        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Metadata XML
// =============================================================================

/// Image sizes written into the synthetic metadata.
#[derive(Debug, Clone, Copy)]
pub struct XmlDims {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub size_c: usize,
    pub pixel_type: PixelType,
    /// Meters per pixel (x, y, z)
    pub scaling: [f64; 3],
}

impl XmlDims {
    pub fn new(size_x: usize, size_y: usize, size_z: usize, size_c: usize, pixel_type: PixelType) -> Self {
        Self {
            size_x,
            size_y,
            size_z,
            size_c,
            pixel_type,
            scaling: [2.5e-7, 2.5e-7, 1e-6],
        }
    }

    /// Metadata laid out the way the acquisition software writes it, with
    /// scaling given as `<Distance>` items.
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
                "<ImageDocument><Metadata><Information><Image>",
                "<PixelType>{}</PixelType>",
                "<SizeX>{}</SizeX><SizeY>{}</SizeY><SizeZ>{}</SizeZ><SizeC>{}</SizeC><SizeT>1</SizeT>",
                "</Image></Information>",
                "<Scaling><Items>",
                "<Distance Id=\"X\"><Value>{:e}</Value><DefaultUnitFormat>µm</DefaultUnitFormat></Distance>",
                "<Distance Id=\"Y\"><Value>{:e}</Value></Distance>",
                "<Distance Id=\"Z\"><Value>{:e}</Value></Distance>",
                "</Items></Scaling></Metadata></ImageDocument>"
            ),
            self.pixel_type,
            self.size_x,
            self.size_y,
            self.size_z,
            self.size_c,
            self.scaling[0],
            self.scaling[1],
            self.scaling[2],
        )
    }
}

// =============================================================================
// Synthetic CZI Builder
// =============================================================================

/// One image plane to store as a sub-block.
#[derive(Debug, Clone)]
pub struct PlaneSpec {
    pub c: i32,
    pub z: i32,
    pub pixels: Vec<u8>,
    pub pixel_type: PixelType,
    pub compression: Compression,
}

/// A built file and where its planes ended up.
pub struct BuiltCzi {
    pub bytes: Vec<u8>,
    pub data_offsets: Vec<u64>,
    pub directory_position: u64,
}

/// Builds CZI files segment by segment.
pub struct CziBuilder {
    xml: String,
    dims: XmlDims,
    planes: Vec<PlaneSpec>,
    leading_deleted: bool,
    with_directory: bool,
    subblock_metadata: usize,
}

impl CziBuilder {
    pub fn new(dims: XmlDims) -> Self {
        Self {
            xml: dims.to_xml(),
            dims,
            planes: Vec::new(),
            leading_deleted: false,
            with_directory: false,
            subblock_metadata: 0,
        }
    }

    /// Replace the generated XML.
    pub fn with_xml(mut self, xml: impl Into<String>) -> Self {
        self.xml = xml.into();
        self
    }

    /// Add a plane whose pixels are produced by `value(x, y)`.
    pub fn plane_with(mut self, c: i32, z: i32, value: impl Fn(usize, usize) -> f32) -> Self {
        let pixel_type = self.dims.pixel_type;
        let mut pixels = Vec::new();
        for y in 0..self.dims.size_y {
            for x in 0..self.dims.size_x {
                let v = value(x, y);
                match pixel_type {
                    PixelType::Gray8 => pixels.push(v as u8),
                    PixelType::Gray16 => pixels.extend_from_slice(&(v as u16).to_le_bytes()),
                    PixelType::Gray32Float => pixels.extend_from_slice(&v.to_le_bytes()),
                    other => panic!("builder cannot encode {}", other),
                }
            }
        }
        self.planes.push(PlaneSpec {
            c,
            z,
            pixels,
            pixel_type,
            compression: Compression::Raw,
        });
        self
    }

    /// Add every (c, z) plane with pixel value `c * 100 + z * 10 + x + y`.
    pub fn full_stack(mut self) -> Self {
        let (size_c, size_z) = (self.dims.size_c.max(1), self.dims.size_z.max(1));
        for c in 0..size_c {
            for z in 0..size_z {
                self = self.plane_with(c as i32, z as i32, move |x, y| {
                    (c * 100 + z * 10 + x + y) as f32
                });
            }
        }
        self
    }

    /// Add a raw plane spec as is.
    pub fn plane(mut self, spec: PlaneSpec) -> Self {
        self.planes.push(spec);
        self
    }

    /// Put a DELETED segment before the file header.
    pub fn leading_deleted(mut self) -> Self {
        self.leading_deleted = true;
        self
    }

    /// Append a ZISRAWDIRECTORY segment listing every sub-block.
    pub fn with_directory(mut self) -> Self {
        self.with_directory = true;
        self
    }

    /// Give every sub-block a metadata blob of `len` bytes before its pixels.
    pub fn subblock_metadata(mut self, len: usize) -> Self {
        self.subblock_metadata = len;
        self
    }

    pub fn build(self) -> BuiltCzi {
        let mut data = Vec::new();
        if self.leading_deleted {
            data.extend(segment(SegmentId::Deleted, &[0u8; 32]));
        }

        let file_offset = data.len();
        let metadata_position = (file_offset + SEGMENT_HEADER_SIZE + FILE_HEADER_SIZE) as u64;
        data.extend(segment(SegmentId::File, &file_header(metadata_position, 0)));

        let mut metadata = MetadataSegmentHeader {
            xml_size: self.xml.len() as u32,
            attachment_size: 0,
        }
        .to_bytes()
        .to_vec();
        metadata.extend_from_slice(self.xml.as_bytes());
        data.extend(segment(SegmentId::Metadata, &metadata));

        let mut entries = Vec::new();
        let mut data_offsets = Vec::new();
        for plane in &self.planes {
            let segment_offset = data.len() as u64;
            let header = SubBlockHeader {
                metadata_size: self.subblock_metadata as u32,
                attachment_size: 0,
                data_size: plane.pixels.len() as u64,
                entry: directory_entry(plane, &self.dims, segment_offset),
            };
            data_offsets.push(header.data_offset(segment_offset));

            let mut body = header.to_bytes();
            body.extend(std::iter::repeat(b'm').take(self.subblock_metadata));
            body.extend_from_slice(&plane.pixels);
            data.extend(segment(SegmentId::SubBlock, &body));
            entries.push(header.entry);
        }

        let mut directory_position = 0;
        if self.with_directory {
            directory_position = data.len() as u64;
            let mut body = vec![0u8; 128];
            body[0..4].copy_from_slice(&(entries.len() as u32).to_le_bytes());
            for entry in &entries {
                body.extend(entry.to_bytes());
            }
            data.extend(segment(SegmentId::Directory, &body));

            let header = file_header(metadata_position, directory_position);
            let start = file_offset + SEGMENT_HEADER_SIZE;
            data[start..start + FILE_HEADER_SIZE].copy_from_slice(&header);
        }

        BuiltCzi {
            bytes: data,
            data_offsets,
            directory_position,
        }
    }
}

/// A segment with its header and body.
pub fn segment(id: SegmentId, body: &[u8]) -> Vec<u8> {
    let mut out = SegmentHeader {
        id,
        allocated_size: body.len() as u64,
        used_size: body.len() as u64,
    }
    .to_bytes()
    .to_vec();
    out.extend_from_slice(body);
    out
}

fn file_header(metadata_position: u64, directory_position: u64) -> Vec<u8> {
    FileHeader {
        major: 1,
        minor: 0,
        primary_file_guid: Guid([7u8; 16]),
        file_guid: Guid([7u8; 16]),
        file_part: 0,
        directory_position,
        metadata_position,
        update_pending: false,
        attachment_directory_position: 0,
    }
    .to_bytes()
}

fn directory_entry(plane: &PlaneSpec, dims: &XmlDims, file_position: u64) -> DirectoryEntry {
    let dim = |name: &str, start: i32, size: i32| DimensionEntry {
        dimension: name.to_string(),
        start,
        size,
        start_coordinate: 0.0,
        stored_size: size,
    };
    DirectoryEntry {
        pixel_type: plane.pixel_type,
        pixel_type_code: plane.pixel_type.code(),
        file_position: file_position as i64,
        file_part: 0,
        compression: plane.compression,
        pyramid_type: PyramidType::None,
        dimensions: vec![
            dim("X", 0, dims.size_x as i32),
            dim("Y", 0, dims.size_y as i32),
            dim("C", plane.c, 1),
            dim("Z", plane.z, 1),
        ],
    }
}
