//! Metadata sidecar written next to a finished video.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slidecast_common::error::SlidecastResult;

use crate::job::JobDescriptor;

/// File name of the sidecar inside the output directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Summary of a successful render (`metadata.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Video file name, without directory.
    pub filename: String,

    /// Size of the video in bytes.
    pub size_bytes: u64,

    /// Size in MiB, rounded to two decimals.
    pub size_mb: f64,

    /// Requested duration in seconds, copied from the job.
    pub duration: f64,

    /// Number of slides.
    pub images_count: usize,

    /// Job title.
    pub title: String,
}

impl OutputMetadata {
    /// Build the record for a rendered job.
    pub fn new(filename: impl Into<String>, size_bytes: u64, job: &JobDescriptor) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
            size_mb: size_mb(size_bytes),
            duration: job.duration_secs,
            images_count: job.image_count(),
            title: job.title.clone(),
        }
    }

    /// Read a previously saved record.
    pub fn load(path: &Path) -> SlidecastResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the record as pretty JSON into `output_dir`, returning its path.
    ///
    /// The JSON goes to a temporary file that is renamed over the sidecar,
    /// so readers never see a truncated record.
    pub fn save(&self, output_dir: &Path) -> SlidecastResult<PathBuf> {
        let path = output_dir.join(METADATA_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;

        let mut staged = tempfile::NamedTempFile::new_in(output_dir)?;
        staged.write_all(json.as_bytes())?;
        staged.persist(&path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), "Saved metadata");
        Ok(path)
    }
}

/// Bytes to MiB, rounded to two decimals.
pub fn size_mb(size_bytes: u64) -> f64 {
    let mb = size_bytes as f64 / 1024.0 / 1024.0;
    (mb * 100.0).round() / 100.0
}
