//! Job descriptor types and loading.
//!
//! A job is the JSON document handed to the renderer. It carries every
//! asset inline as base64 so a single file fully describes the video:
//!
//! ```json
//! {
//!   "title": "Demo",
//!   "filename": "My Cool Video",
//!   "duration": 10.0,
//!   "audio": { "data": "<base64>" },
//!   "images": [{ "data": "<base64>" }, { "data": "<base64>" }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use slidecast_common::error::{SlidecastError, SlidecastResult};

/// Title used when the job does not name one.
pub const DEFAULT_TITLE: &str = "Unknown";

/// Output file name used when the job does not name one.
pub const DEFAULT_FILENAME: &str = "video";

/// A binary asset embedded in the job as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAsset {
    /// Base64 payload (standard alphabet, padded).
    pub data: String,
}

/// A validated render job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    /// Human-readable title, copied into the metadata record.
    pub title: String,

    /// Requested output name before sanitizing.
    pub filename: String,

    /// Target video length in seconds. Always finite and positive.
    pub duration_secs: f64,

    /// Soundtrack.
    pub audio: EmbeddedAsset,

    /// Slides in playback order. Never empty.
    pub images: Vec<EmbeddedAsset>,
}

impl JobDescriptor {
    /// Read and validate a job file.
    pub fn load(path: impl AsRef<Path>) -> SlidecastResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SlidecastError::InputUnreadable {
                path: path.to_path_buf(),
                source: e,
            })?;
        let job = Self::parse(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            images = job.images.len(),
            duration_secs = job.duration_secs,
            "Loaded job"
        );
        Ok(job)
    }

    /// Parse and validate job JSON. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: impl AsRef<Path>) -> SlidecastResult<Self> {
        let origin = origin.as_ref();
        let raw: RawJob = serde_json::from_str(content)
            .map_err(|e| SlidecastError::malformed(origin, e.to_string()))?;
        raw.into_job(origin)
    }

    /// Number of slides.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// How long each slide stays on screen. Not rounded.
    pub fn seconds_per_image(&self) -> f64 {
        self.duration_secs / self.images.len() as f64
    }
}

#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    duration: Option<RawDuration>,
    #[serde(default)]
    audio: Option<RawAsset>,
    #[serde(default)]
    images: Option<Vec<RawAsset>>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    #[serde(default)]
    data: Option<String>,
}

/// Producers sometimes send the duration as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Number(f64),
    Text(String),
}

impl RawJob {
    fn into_job(self, origin: &Path) -> SlidecastResult<JobDescriptor> {
        let audio = self
            .audio
            .ok_or_else(|| SlidecastError::missing_field("audio"))?
            .data
            .ok_or_else(|| SlidecastError::missing_field("audio.data"))?;

        let images = self
            .images
            .ok_or_else(|| SlidecastError::missing_field("images"))?
            .into_iter()
            .enumerate()
            .map(|(index, asset)| {
                asset
                    .data
                    .map(|data| EmbeddedAsset { data })
                    .ok_or_else(|| SlidecastError::missing_field(format!("images[{index}].data")))
            })
            .collect::<SlidecastResult<Vec<_>>>()?;

        let duration_secs = match self
            .duration
            .ok_or_else(|| SlidecastError::missing_field("duration"))?
        {
            RawDuration::Number(secs) => secs,
            RawDuration::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                SlidecastError::malformed(origin, format!("duration {text:?} is not a number"))
            })?,
        };

        if images.is_empty() {
            return Err(SlidecastError::invalid_job("job contains no images"));
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(SlidecastError::invalid_job(format!(
                "duration must be a positive number of seconds, got {duration_secs}"
            )));
        }

        Ok(JobDescriptor {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            filename: self.filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            duration_secs,
            audio: EmbeddedAsset { data: audio },
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "video_data.json";

    fn parse(content: &str) -> SlidecastResult<JobDescriptor> {
        JobDescriptor::parse(content, ORIGIN)
    }

    #[test]
    fn test_parse_complete_job() {
        let job = parse(
            r#"{
                "title": "Demo",
                "filename": "My Cool Video",
                "duration": 10.0,
                "audio": {"data": "AAEC"},
                "images": [{"data": "AQ=="}, {"data": "Ag=="}]
            }"#,
        )
        .unwrap();

        assert_eq!(job.title, "Demo");
        assert_eq!(job.filename, "My Cool Video");
        assert_eq!(job.duration_secs, 10.0);
        assert_eq!(job.audio.data, "AAEC");
        assert_eq!(job.image_count(), 2);
        assert_eq!(job.images[1].data, "Ag==");
        assert_eq!(job.seconds_per_image(), 5.0);
    }

    #[test]
    fn test_cosmetic_fields_fall_back() {
        let job = parse(r#"{"duration": 3, "audio": {"data": ""}, "images": [{"data": ""}]}"#)
            .unwrap();
        assert_eq!(job.title, "Unknown");
        assert_eq!(job.filename, "video");
    }

    #[test]
    fn test_null_title_falls_back() {
        let job = parse(
            r#"{"title": null, "duration": 3, "audio": {"data": ""}, "images": [{"data": ""}]}"#,
        )
        .unwrap();
        assert_eq!(job.title, "Unknown");
    }

    #[test]
    fn test_string_duration_is_accepted() {
        let job = parse(r#"{"duration": " 7.5 ", "audio": {"data": ""}, "images": [{"data": ""}]}"#)
            .unwrap();
        assert_eq!(job.duration_secs, 7.5);
    }

    #[test]
    fn test_non_numeric_duration_is_malformed() {
        let err = parse(r#"{"duration": "long", "audio": {"data": ""}, "images": [{"data": ""}]}"#)
            .unwrap_err();
        assert!(matches!(err, SlidecastError::MalformedInput { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse("{ not json").unwrap_err();
        match err {
            SlidecastError::MalformedInput { path, .. } => {
                assert_eq!(path, std::path::PathBuf::from(ORIGIN));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = parse(r#"{"duration": 3, "audio": {"data": ""}, "images": "nope"}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::MalformedInput { .. }));
    }

    #[test]
    fn test_missing_audio_is_reported() {
        let err = parse(r#"{"duration": 3, "images": [{"data": ""}]}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::MissingField { ref field } if field == "audio"));

        let err = parse(r#"{"duration": 3, "audio": {}, "images": [{"data": ""}]}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::MissingField { ref field } if field == "audio.data"));
    }

    #[test]
    fn test_missing_image_data_names_index() {
        let err = parse(r#"{"duration": 3, "audio": {"data": ""}, "images": [{"data": ""}, {}]}"#)
            .unwrap_err();
        assert!(
            matches!(err, SlidecastError::MissingField { ref field } if field == "images[1].data")
        );
    }

    #[test]
    fn test_missing_images_and_duration_are_reported() {
        let err = parse(r#"{"duration": 3, "audio": {"data": ""}}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::MissingField { ref field } if field == "images"));

        let err = parse(r#"{"audio": {"data": ""}, "images": [{"data": ""}]}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::MissingField { ref field } if field == "duration"));
    }

    #[test]
    fn test_empty_image_list_is_rejected() {
        let err = parse(r#"{"duration": 3, "audio": {"data": ""}, "images": []}"#).unwrap_err();
        assert!(matches!(err, SlidecastError::InvalidJob { .. }));
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        for duration in ["0", "-2.5"] {
            let content = format!(
                r#"{{"duration": {duration}, "audio": {{"data": ""}}, "images": [{{"data": ""}}]}}"#
            );
            let err = parse(&content).unwrap_err();
            assert!(matches!(err, SlidecastError::InvalidJob { .. }), "{duration}");
        }
    }

    #[test]
    fn test_load_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JobDescriptor::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SlidecastError::InputUnreadable { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_data.json");
        std::fs::write(
            &path,
            r#"{"title": "Disk", "duration": 4, "audio": {"data": ""}, "images": [{"data": ""}]}"#,
        )
        .unwrap();

        let job = JobDescriptor::load(&path).unwrap();
        assert_eq!(job.title, "Disk");
        assert_eq!(job.seconds_per_image(), 4.0);
    }
}
