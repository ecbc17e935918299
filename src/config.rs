//! Command-line configuration for czi-skim.
//!
//! Three subcommands:
//! - `skim`: extract XML, write the NHDR, optionally compute projections
//! - `info`: describe a CZI file without writing anything
//! - `nhdrcheck`: list line-summary files in an output directory
//!
//! # Environment Variables
//!
//! - `CZI_SKIM_BLOCK_SIZE` - Read cache block size in bytes (default: 262144)
//! - `CZI_SKIM_CACHE_BLOCKS` - Number of cached blocks (default: 100)
//! - `CZI_SKIM_PATH` - Directory searched by `nhdrcheck` (default: ./nhdr)

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::io::{DEFAULT_BLOCK_CACHE_CAPACITY, DEFAULT_BLOCK_SIZE};
use crate::skim::SkimOptions;

// =============================================================================
// Limits
// =============================================================================

/// Smallest accepted cache block size.
pub const MIN_BLOCK_SIZE: usize = 1024;

/// Largest accepted cache block size.
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// czi-skim - inspect Zeiss CZI light-sheet files and wrap them as NRRD.
#[derive(Parser, Debug, Clone)]
#[command(name = "czi-skim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write the XML metadata and an NRRD header that points into the CZI
    /// file, plus optional axis-aligned projections.
    Skim(SkimConfig),

    /// Print the file header, metadata and sub-block summary.
    Info(InfoConfig),

    /// Count line-summary NRRD files in a directory.
    #[command(name = "nhdrcheck")]
    NhdrCheck(NhdrCheckConfig),
}

/// Read cache settings shared by the commands that open CZI files.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Block size in bytes for the read cache.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, env = "CZI_SKIM_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks kept in the read cache.
    #[arg(long, default_value_t = DEFAULT_BLOCK_CACHE_CAPACITY, env = "CZI_SKIM_CACHE_BLOCKS")]
    pub cache_blocks: usize,
}

impl Default for CacheArgs {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            cache_blocks: DEFAULT_BLOCK_CACHE_CAPACITY,
        }
    }
}

impl CacheArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.block_size < MIN_BLOCK_SIZE || self.block_size > MAX_BLOCK_SIZE {
            return Err("block_size must be between 1KB and 16MB".to_string());
        }
        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Skim Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct SkimConfig {
    /// Input CZI file.
    pub file: PathBuf,

    /// Output NRRD header (defaults to the input name with .nhdr).
    #[arg(short = 'n', long)]
    pub nhdr: Option<PathBuf>,

    /// Output XML file (defaults to the input name with .xml).
    #[arg(short = 'x', long)]
    pub xml: Option<PathBuf>,

    /// Base name for projections; "foo" writes foo-projXY.nrrd,
    /// foo-projXZ.nrrd and foo-projYZ.nrrd.
    #[arg(short = 'p', long)]
    pub proj: Option<String>,

    /// Verbosity; repeat for more detail (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub cache: CacheArgs,
}

impl SkimConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_czi_path(&self.file)?;
        self.cache.validate()
    }

    /// Options for the skim pipeline.
    pub fn to_options(&self) -> SkimOptions {
        let mut options = SkimOptions::new(&self.file)
            .with_cache(self.cache.block_size, self.cache.cache_blocks);
        if let Some(ref nhdr) = self.nhdr {
            options = options.with_nhdr(nhdr);
        }
        if let Some(ref xml) = self.xml {
            options = options.with_xml(xml);
        }
        if let Some(ref proj) = self.proj {
            options = options.with_proj(proj.clone());
        }
        options
    }
}

// =============================================================================
// Info Command
// =============================================================================

/// Output format for the info command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InfoOutputFormat {
    /// Human-readable sections
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// Input CZI file.
    pub file: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = InfoOutputFormat::Text)]
    pub format: InfoOutputFormat,

    /// Verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub cache: CacheArgs,
}

impl InfoConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_czi_path(&self.file)?;
        self.cache.validate()
    }
}

// =============================================================================
// NhdrCheck Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct NhdrCheckConfig {
    /// Directory containing *-line.nrrd files (defaults to ./nhdr).
    #[arg(short, long, env = "CZI_SKIM_PATH")]
    pub path: Option<PathBuf>,

    /// Verbosity; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn validate_czi_path(path: &Path) -> Result<(), String> {
    let name = path.to_string_lossy();
    match name.strip_suffix(".czi") {
        Some(base) if !base.is_empty() => Ok(()),
        _ => Err(format!("Input file {} does not end with .czi", name)),
    }
}

// =============================================================================
// Tests
// =============================================================================
