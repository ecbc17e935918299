//! Scan a directory for line-summary NRRD files.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{IoError, SkimError};

/// Default directory, relative to the working directory.
pub const DEFAULT_NHDR_DIR: &str = "nhdr";

/// File name fragment marking a line-summary file.
const LINE_MARKER: &str = "line";

#[derive(Debug, Clone)]
pub struct NhdrCheck {
    path: PathBuf,
}

impl NhdrCheck {
    /// Check `path`, or `<cwd>/nhdr` when none is given.
    pub fn new(path: Option<PathBuf>) -> Result<Self, SkimError> {
        let path = match path {
            Some(path) => path,
            None => std::env::current_dir()
                .map_err(IoError::from)?
                .join(DEFAULT_NHDR_DIR),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the line files in the directory, sorted by name.
    pub async fn run(&self) -> Result<Vec<PathBuf>, SkimError> {
        let is_dir = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SkimError::NotADirectory(self.path.display().to_string()));
        }

        info!(path = %self.path.display(), "Searching for line nrrd files");

        let mut dir = tokio::fs::read_dir(&self.path).await.map_err(IoError::from)?;
        let mut found = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(IoError::from)? {
            if entry.file_name().to_string_lossy().contains(LINE_MARKER) {
                debug!(file = %entry.path().display(), "Line file");
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }
}
