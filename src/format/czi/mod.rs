//! CZI (Carl Zeiss Image) container parser.
//!
//! # Key Concepts
//!
//! - **Segments**: the file is a flat list of segments, each introduced by a
//!   32-byte header carrying an ASCII id and the allocated body size.
//!   Unknown and `DELETED` segments are skipped by size.
//!
//! - **File header**: the `ZISRAWFILE` segment points at the metadata,
//!   sub-block directory and attachment directory segments.
//!
//! - **Metadata**: one XML document with image sizes, voxel scaling and the
//!   pixel type.
//!
//! - **Sub-blocks**: each `ZISRAWSUBBLOCK` holds one image plane plus a
//!   directory entry whose dimension entries say where the plane sits
//!   (channel `C`, slice `Z`, ...). Uncompressed planes can be addressed in
//!   place, which is what the NHDR skip list relies on.
//!
//! All values are little-endian.

mod directory;
mod header;
mod metadata;
mod reader;
mod segment;
mod subblock;
mod types;

pub use directory::{DirectorySummary, SubBlockDirectory, DIRECTORY_HEADER_SIZE};
pub use header::{FileHeader, Guid, FILE_HEADER_SIZE};
pub use metadata::{ImageDims, MetadataSegmentHeader, METADATA_HEADER_SIZE};
pub use reader::{decode_plane, CziReader, Metadata, SubBlockInfo, SubBlockScan};
pub use segment::{SegmentHeader, SegmentId, SEGMENT_HEADER_SIZE};
pub use subblock::{
    DimensionEntry, DirectoryEntry, SubBlockHeader, DIMENSION_ENTRY_SIZE,
    DIRECTORY_ENTRY_FIXED_SIZE, MAX_DIMENSIONS, SUBBLOCK_MIN_HEADER_SIZE,
};
pub use types::{Compression, PixelType, PyramidType};
