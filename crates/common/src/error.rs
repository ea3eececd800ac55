//! Error types shared across Slidecast crates.

use std::path::PathBuf;

/// Top-level error type for Slidecast operations.
#[derive(Debug, thiserror::Error)]
pub enum SlidecastError {
    #[error("Cannot read job file {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed job file {path}: {message}")]
    MalformedInput { path: PathBuf, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid job: {message}")]
    InvalidJob { message: String },

    #[error("Failed to decode {asset}: {source}")]
    Decode {
        asset: String,
        source: base64::DecodeError,
    },

    #[error("Staging I/O error at {path}: {source}")]
    StagingIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Encoder failed ({status})")]
    EncoderFailure {
        status: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Encoder unavailable: {binary} ({message})")]
    EncoderUnavailable { binary: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SlidecastError.
pub type SlidecastResult<T> = Result<T, SlidecastError>;

impl SlidecastError {
    pub fn malformed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob {
            message: msg.into(),
        }
    }

    pub fn decode(asset: impl Into<String>, source: base64::DecodeError) -> Self {
        Self::Decode {
            asset: asset.into(),
            source,
        }
    }

    pub fn staging_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StagingIo {
            path: path.into(),
            source,
        }
    }

    pub fn encoder_failure(
        status: &std::process::ExitStatus,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::EncoderFailure {
            status: status.to_string(),
            code: status.code(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether this error came from the external encoder rather than from
    /// the job or the local filesystem.
    pub fn is_encoder_failure(&self) -> bool {
        matches!(
            self,
            Self::EncoderFailure { .. } | Self::EncoderUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_field() {
        let err = SlidecastError::missing_field("audio.data");
        assert_eq!(err.to_string(), "Missing required field: audio.data");
    }

    #[test]
    fn test_staging_io_message_includes_path() {
        let err = SlidecastError::staging_io(
            "/tmp/slidecast-x/audio.mp3",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/slidecast-x/audio.mp3"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_encoder_classification() {
        let unavailable = SlidecastError::EncoderUnavailable {
            binary: "ffmpeg".to_string(),
            message: "not found".to_string(),
        };
        assert!(unavailable.is_encoder_failure());
        assert!(!SlidecastError::invalid_job("no images").is_encoder_failure());
    }
}
