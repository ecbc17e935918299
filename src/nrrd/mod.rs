//! NRRD output.
//!
//! - [`nhdr`]: detached headers whose skip list points at planes inside the
//!   CZI file, so no pixel data is copied
//! - [`writer`]: self-contained float volumes for projections

mod nhdr;
mod writer;

pub use nhdr::{NhdrHeader, SkipEntry};
pub use writer::NrrdVolume;
