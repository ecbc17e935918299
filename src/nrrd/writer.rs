//! Attached-header NRRD writer for float volumes.
//!
//! Used for the projection images. The layout is a text header, a blank
//! line, then the samples as little-endian `f32` with the first axis
//! varying fastest.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::error::{IoError, NrrdError};

/// A dense float volume with one label per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NrrdVolume {
    pub sizes: Vec<usize>,
    pub labels: Vec<String>,
    pub data: Vec<f32>,
}

impl NrrdVolume {
    /// Create a zero-filled volume.
    ///
    /// Fails with `TooLarge` when the sample count overflows or the buffer
    /// cannot be reserved.
    pub fn zeros(sizes: Vec<usize>, labels: &[&str]) -> Result<Self, NrrdError> {
        let Some(len) = sizes
            .iter()
            .try_fold(1usize, |acc, &size| acc.checked_mul(size))
        else {
            return Err(NrrdError::TooLarge { sizes });
        };
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            return Err(NrrdError::TooLarge { sizes });
        }
        data.resize(len, 0.0);
        Ok(Self {
            sizes,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            data,
        })
    }

    pub fn dimension(&self) -> usize {
        self.sizes.len()
    }

    /// Linear index of a sample, first axis fastest.
    ///
    /// Callers must pass one in-range coordinate per axis.
    pub fn index(&self, coords: &[usize]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for (coord, size) in coords.iter().zip(&self.sizes) {
            index += coord * stride;
            stride *= size;
        }
        index
    }

    pub fn get(&self, coords: &[usize]) -> f32 {
        self.data[self.index(coords)]
    }

    fn validate(&self) -> Result<(), NrrdError> {
        if self.labels.len() != self.sizes.len() {
            return Err(NrrdError::LabelMismatch {
                labels: self.labels.len(),
                dimension: self.sizes.len(),
            });
        }
        let expected: usize = self.sizes.iter().product();
        if expected != self.data.len() {
            return Err(NrrdError::SizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// The text header, including the terminating blank line.
    pub fn header(&self) -> Result<String, NrrdError> {
        self.validate()?;

        let mut out = String::new();
        let _ = writeln!(out, "NRRD0004");
        let _ = writeln!(out, "# Complete NRRD file format specification at:");
        let _ = writeln!(out, "# http://teem.sourceforge.net/nrrd/format.html");
        let _ = writeln!(out, "type: float");
        let _ = writeln!(out, "dimension: {}", self.dimension());

        let sizes: Vec<String> = self.sizes.iter().map(|s| s.to_string()).collect();
        let _ = writeln!(out, "sizes: {}", sizes.join(" "));

        let labels: Vec<String> = self.labels.iter().map(|l| format!("\"{}\"", l)).collect();
        let _ = writeln!(out, "labels: {}", labels.join(" "));

        let _ = writeln!(out, "endian: little");
        let _ = writeln!(out, "encoding: raw");
        out.push('\n');
        Ok(out)
    }

    /// Encode the complete file.
    pub fn encode(&self) -> Result<Vec<u8>, NrrdError> {
        let header = self.header()?;
        let mut out = Vec::with_capacity(header.len() + self.data.len() * 4);
        out.extend_from_slice(header.as_bytes());
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        Ok(out)
    }

    /// Write the volume to `path`, replacing any existing file.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), NrrdError> {
        let path = path.as_ref();
        let bytes = self.encode()?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| IoError::File(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Wrote NRRD volume");
        Ok(())
    }
}
