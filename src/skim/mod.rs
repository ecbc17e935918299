//! Skim workflow: XML extraction, NHDR generation and projections.
//!
//! - [`Skim`] runs the whole pipeline for one CZI file
//! - [`Projections`] accumulates max/mean projections plane by plane
//! - [`NhdrCheck`] lists line-summary files in an output directory
//! - [`FileInfo`] describes a file without writing anything

mod check;
mod info;
mod pipeline;
mod projection;

pub use check::{NhdrCheck, DEFAULT_NHDR_DIR};
pub use info::FileInfo;
pub use pipeline::{ProjectionPaths, Skim, SkimOptions, SkimPaths, SkimReport};
pub use projection::{Projections, PROJECTION_KINDS};
