//! The skim pipeline.
//!
//! One pass over a CZI file that produces:
//! - the XML metadata, written verbatim
//! - an NRRD detached header whose skip list points at every raw plane
//! - optionally, max/mean projections along each axis
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Skim                               │
//! │  1. Open file (BlockCache over FileRangeReader)              │
//! │  2. Parse file header, read metadata, write XML              │
//! │  3. Check pixel type                                         │
//! │  4. Scan sub-blocks: validate, record offset, project        │
//! │  5. Pad skip list, write NHDR and projection volumes         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{IoError, SkimError};
use crate::format::czi::{
    Compression, CziReader, ImageDims, SubBlockInfo, SEGMENT_HEADER_SIZE,
};
use crate::io::{
    BlockCache, CacheStats, FileRangeReader, RangeReader, DEFAULT_BLOCK_CACHE_CAPACITY,
    DEFAULT_BLOCK_SIZE,
};
use crate::nrrd::{NhdrHeader, SkipEntry};

use super::projection::Projections;

const CZI_SUFFIX: &str = ".czi";

// =============================================================================
// Options
// =============================================================================

/// Inputs for one skim run.
#[derive(Debug, Clone)]
pub struct SkimOptions {
    /// Input CZI file; must end with `.czi`
    pub file: PathBuf,

    /// Output NHDR path (defaults to `<base>.nhdr`)
    pub nhdr: Option<PathBuf>,

    /// Output XML path (defaults to `<base>.xml`)
    pub xml: Option<PathBuf>,

    /// Projection base name; `None` skips projections
    pub proj: Option<String>,

    /// Block size of the read cache
    pub block_size: usize,

    /// Number of cached blocks
    pub cache_blocks: usize,
}

impl SkimOptions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            nhdr: None,
            xml: None,
            proj: None,
            block_size: DEFAULT_BLOCK_SIZE,
            cache_blocks: DEFAULT_BLOCK_CACHE_CAPACITY,
        }
    }

    pub fn with_nhdr(mut self, path: impl Into<PathBuf>) -> Self {
        self.nhdr = Some(path.into());
        self
    }

    pub fn with_xml(mut self, path: impl Into<PathBuf>) -> Self {
        self.xml = Some(path.into());
        self
    }

    pub fn with_proj(mut self, base: impl Into<String>) -> Self {
        self.proj = Some(base.into());
        self
    }

    pub fn with_cache(mut self, block_size: usize, cache_blocks: usize) -> Self {
        self.block_size = block_size;
        self.cache_blocks = cache_blocks;
        self
    }

    /// Check the input name and fill in default output paths.
    pub fn resolve(&self) -> Result<SkimPaths, SkimError> {
        let czi = self.file.to_string_lossy().into_owned();
        let base = match czi.strip_suffix(CZI_SUFFIX) {
            Some(base) if !base.is_empty() => base,
            _ => return Err(SkimError::NotCzi(czi)),
        };

        let nhdr = self
            .nhdr
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.nhdr", base)));
        let xml = self
            .xml
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.xml", base)));
        let projections = self
            .proj
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(ProjectionPaths::from_base);

        Ok(SkimPaths {
            czi: self.file.clone(),
            nhdr,
            xml,
            projections,
        })
    }
}

/// Output locations of the three projection volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionPaths {
    pub xy: PathBuf,
    pub xz: PathBuf,
    pub yz: PathBuf,
}

impl ProjectionPaths {
    pub fn from_base(base: &str) -> Self {
        Self {
            xy: PathBuf::from(format!("{}-projXY.nrrd", base)),
            xz: PathBuf::from(format!("{}-projXZ.nrrd", base)),
            yz: PathBuf::from(format!("{}-projYZ.nrrd", base)),
        }
    }
}

/// Resolved input and output paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkimPaths {
    pub czi: PathBuf,
    pub nhdr: PathBuf,
    pub xml: PathBuf,
    pub projections: Option<ProjectionPaths>,
}

// =============================================================================
// Report
// =============================================================================

/// Summary of a finished skim run.
#[derive(Debug, Clone, Serialize)]
pub struct SkimReport {
    pub paths: SkimPaths,
    pub dims: ImageDims,

    /// Sub-blocks found in the file
    pub planes: usize,

    /// Skip list lines added to reach `size_c * size_z`
    pub padded: usize,

    pub cache: CacheStats,
}

// =============================================================================
// Skim
// =============================================================================

/// Runs the skim pipeline for one file.
///
/// # Example
///
/// ```ignore
/// use czi_skim::skim::{Skim, SkimOptions};
///
/// let options = SkimOptions::new("stack.czi").with_proj("stack");
/// let report = Skim::new(options)?.run().await?;
/// println!("{} planes", report.planes);
/// ```
pub struct Skim {
    options: SkimOptions,
    paths: SkimPaths,
}

impl Skim {
    /// Validate the options and resolve output paths. No files are touched.
    pub fn new(options: SkimOptions) -> Result<Self, SkimError> {
        let paths = options.resolve()?;
        Ok(Self { options, paths })
    }

    pub fn paths(&self) -> &SkimPaths {
        &self.paths
    }

    /// Open the input file and run the pipeline.
    pub async fn run(&self) -> Result<SkimReport, SkimError> {
        info!(
            czi = %self.paths.czi.display(),
            nhdr = %self.paths.nhdr.display(),
            xml = %self.paths.xml.display(),
            proj = ?self.options.proj,
            "Skimming"
        );

        let file = FileRangeReader::open(&self.paths.czi).await?;
        let cache = BlockCache::with_capacity(file, self.options.block_size, self.options.cache_blocks);
        let czi = CziReader::open(cache).await?;

        let mut report = self.process(&czi).await?;
        report.cache = czi.inner().stats();
        Ok(report)
    }

    /// Run the pipeline over an already opened reader.
    pub async fn process<R: RangeReader>(
        &self,
        czi: &CziReader<R>,
    ) -> Result<SkimReport, SkimError> {
        let header = czi.header();
        debug!(
            major = header.major,
            minor = header.minor,
            file_part = header.file_part,
            metadata_position = header.metadata_position,
            update_pending = header.update_pending,
            "File header"
        );

        // Metadata and XML
        let metadata = czi.read_metadata().await?;
        debug!(
            xml_size = metadata.segment.xml_size,
            attachment_size = metadata.segment.attachment_size,
            "Metadata segment"
        );
        write_file(&self.paths.xml, &metadata.raw_xml).await?;
        info!(path = %self.paths.xml.display(), "Wrote XML metadata");

        let dims = metadata.dims;
        debug!(?dims, "Image dimensions from XML");

        let nhdr = NhdrHeader::from_dims(&dims)
            .map_err(|_| SkimError::UnsupportedPixelType(dims.pixel_type.to_string()))?;
        let expected = check_dims(&dims, czi.inner().size())?;

        // Sub-blocks
        let file_name = self.paths.czi.to_string_lossy().into_owned();
        let mut projections = self
            .paths
            .projections
            .as_ref()
            .map(|_| Projections::new(dims.size_x, dims.size_y, dims.size_z, dims.size_c))
            .transpose()?;
        let mut entries: Vec<SkipEntry> = Vec::new();

        debug!(slices = dims.size_z, channels = dims.size_c, "Looking for planes");
        let mut scan = czi.subblocks();
        while let Some(info) = scan.next().await? {
            check_subblock(&info, &dims)?;
            let (c, z) = info.header.entry.plane_index();
            trace!(
                offset = info.segment_offset,
                allocated = info.segment.allocated_size,
                metadata_size = info.header.metadata_size,
                data_size = info.header.data_size,
                dimensions = ?info.header.entry.dimensions,
                "Sub-block"
            );
            debug!(c, z, data_offset = info.data_offset, "Plane");

            entries.push(SkipEntry::new(info.data_offset, file_name.clone()));

            if let Some(projections) = projections.as_mut() {
                let plane = czi.read_plane(&info, &dims).await?;
                projections.update(&plane, c, z)?;
            }
        }

        let planes = entries.len();
        let last = match entries.last() {
            Some(last) => last.clone(),
            None => return Err(SkimError::NoSubBlocks(file_name)),
        };

        // Incomplete acquisitions lose their final planes; repeat the last
        // one so readers still see size_c * size_z planes.
        let padded = expected.saturating_sub(planes);
        if padded > 0 {
            warn!(
                found = planes,
                expected, "Fewer planes than SizeC*SizeZ, repeating the last plane"
            );
            entries.extend(std::iter::repeat(last).take(padded));
        }

        write_file(&self.paths.nhdr, nhdr.render(&entries).as_bytes()).await?;
        info!(path = %self.paths.nhdr.display(), planes = entries.len(), "Wrote NHDR");

        if let (Some(projections), Some(paths)) = (projections, self.paths.projections.as_ref()) {
            let [xy, xz, yz] = projections.into_volumes();
            xy.write_to(&paths.xy).await?;
            xz.write_to(&paths.xz).await?;
            yz.write_to(&paths.yz).await?;
            info!(
                xy = %paths.xy.display(),
                xz = %paths.xz.display(),
                yz = %paths.yz.display(),
                "Wrote projections"
            );
        }

        Ok(SkimReport {
            paths: self.paths.clone(),
            dims,
            planes,
            padded,
            cache: CacheStats::default(),
        })
    }
}

/// A sub-block must carry the XML pixel type and be stored uncompressed.
fn check_subblock(info: &SubBlockInfo, dims: &ImageDims) -> Result<(), SkimError> {
    let entry = &info.header.entry;
    if entry.pixel_type != dims.pixel_type {
        return Err(SkimError::PixelTypeMismatch {
            offset: info.segment_offset,
            expected: dims.pixel_type.to_string(),
            found: entry.pixel_type.to_string(),
        });
    }
    if entry.compression != Compression::Raw {
        return Err(SkimError::UnsupportedCompression {
            offset: info.segment_offset,
            compression: entry.compression.to_string(),
        });
    }
    Ok(())
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), SkimError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| IoError::File(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

/// Reject XML sizes the file cannot hold and return the expected plane count.
///
/// One raw plane must fit in the file, and a complete acquisition stores at
/// least a segment header per plane.
fn check_dims(dims: &ImageDims, file_size: u64) -> Result<usize, SkimError> {
    let invalid = |reason: &str| {
        SkimError::InvalidDimensions(format!(
            "SizeX={} SizeY={} SizeZ={} SizeC={}: {}",
            dims.size_x, dims.size_y, dims.size_z, dims.size_c, reason
        ))
    };

    if dims.size_x == 0 || dims.size_y == 0 {
        return Err(invalid("empty plane"));
    }
    match dims.plane_bytes() {
        Some(bytes) if bytes as u64 <= file_size => {}
        _ => return Err(invalid("plane larger than the file")),
    }
    match dims.expected_planes() {
        Some(planes) if planes as u64 <= file_size / SEGMENT_HEADER_SIZE as u64 => Ok(planes),
        _ => Err(invalid("more planes than the file can hold")),
    }
}
