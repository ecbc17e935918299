//! # czi-skim
//!
//! Tools for Zeiss CZI light-sheet microscopy files.
//!
//! A CZI file is a flat sequence of segments. For uncompressed acquisitions
//! every image plane sits contiguously inside one sub-block segment, so an
//! NRRD detached header can point straight at the planes without copying
//! any pixels.
//!
//! ## Features
//!
//! - **Random-access parsing**: segment headers, metadata and sub-blocks are
//!   read through a block cache; files are never loaded whole
//! - **NHDR generation**: `data file: SKIPLIST 2` headers with one byte
//!   offset per plane
//! - **Projections**: max and mean projections along each axis, per channel
//! - **Metadata extraction**: the XML is written out verbatim
//!
//! ## Architecture
//!
//! - [`io`] - Range readers over local files and memory, plus block caching
//! - [`mod@format`] - CZI segment, metadata and sub-block parsers
//! - [`nrrd`] - NHDR and attached NRRD writers
//! - [`skim`] - The skim pipeline, file info and nhdr check
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use czi_skim::{Skim, SkimOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), czi_skim::SkimError> {
//!     let options = SkimOptions::new("embryo.czi").with_proj("embryo");
//!     let report = Skim::new(options)?.run().await?;
//!     println!("{} planes -> {}", report.planes, report.paths.nhdr.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod nrrd;
pub mod skim;

// Re-export commonly used types
pub use config::{Cli, Command, InfoConfig, InfoOutputFormat, NhdrCheckConfig, SkimConfig};
pub use error::{CziError, FormatError, IoError, NrrdError, SkimError};
pub use format::czi::{
    Compression, CziReader, DirectoryEntry, FileHeader, ImageDims, Metadata, PixelType,
    SegmentHeader, SegmentId, SubBlockHeader, SubBlockInfo,
};
pub use format::{detect_format, is_czi_header, FileFormat};
pub use io::{BlockCache, CacheStats, FileRangeReader, MemoryRangeReader, RangeReader};
pub use nrrd::{NhdrHeader, NrrdVolume, SkipEntry};
pub use skim::{FileInfo, NhdrCheck, Projections, Skim, SkimOptions, SkimReport};
