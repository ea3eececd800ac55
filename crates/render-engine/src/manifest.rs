//! Concat-demuxer manifest generation.
//!
//! ffmpeg's concat demuxer ignores the duration of the last listed file, so
//! the final slide is listed twice: once with its duration and once without.
//! A manifest for N slides therefore always has N + 1 entries.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use slidecast_common::error::{SlidecastError, SlidecastResult};

/// One `file` directive, optionally followed by a `duration` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Staged image.
    pub path: PathBuf,

    /// Display time in seconds; `None` for the trailing repeat.
    pub duration_secs: Option<f64>,
}

/// Ordered slide list handed to the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatManifest {
    entries: Vec<ManifestEntry>,
    seconds_per_image: f64,
}

impl ConcatManifest {
    /// Spread `total_duration_secs` uniformly over `images`, in order.
    pub fn build(images: &[PathBuf], total_duration_secs: f64) -> SlidecastResult<Self> {
        let last = images
            .last()
            .ok_or_else(|| SlidecastError::invalid_job("cannot build a manifest without images"))?;
        if !total_duration_secs.is_finite() || total_duration_secs <= 0.0 {
            return Err(SlidecastError::invalid_job(format!(
                "manifest duration must be positive, got {total_duration_secs}"
            )));
        }

        let seconds_per_image = total_duration_secs / images.len() as f64;
        let mut entries: Vec<ManifestEntry> = images
            .iter()
            .map(|path| ManifestEntry {
                path: path.clone(),
                duration_secs: Some(seconds_per_image),
            })
            .collect();
        entries.push(ManifestEntry {
            path: last.clone(),
            duration_secs: None,
        });

        Ok(Self {
            entries,
            seconds_per_image,
        })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn seconds_per_image(&self) -> f64 {
        self.seconds_per_image
    }

    /// Sum of all declared durations.
    pub fn declared_duration_secs(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.duration_secs).sum()
    }

    /// Render in concat-demuxer syntax.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "file {}", quote_path(&entry.path));
            if let Some(duration) = entry.duration_secs {
                let _ = writeln!(out, "duration {duration}");
            }
        }
        out
    }
}

/// Single-quote a path for the concat demuxer. Embedded quotes become `'\''`.
fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}
