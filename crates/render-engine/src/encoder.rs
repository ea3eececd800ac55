//! External encoder invocation.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use slidecast_common::config::DEFAULT_ENCODER_BINARY;
use slidecast_common::error::{SlidecastError, SlidecastResult};

/// Output frame rate.
pub const FRAME_RATE: u32 = 30;

/// Output video codec.
pub const VIDEO_CODEC: &str = "libx264";

/// Output audio codec.
pub const AUDIO_CODEC: &str = "aac";

/// Output pixel format, for player compatibility.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Inputs and output of one encode.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Concat-demuxer manifest listing the slides.
    pub manifest_path: PathBuf,

    /// Staged soundtrack.
    pub audio_path: PathBuf,

    /// Destination video; overwritten if present.
    pub output_path: PathBuf,
}

/// Captured output of a successful encode.
#[derive(Debug, Clone, Default)]
pub struct EncodeOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Trait for encoder backends.
pub trait EncodeBackend {
    /// Run one encode to completion. Non-zero exit is
    /// [`SlidecastError::EncoderFailure`].
    fn encode(&self, request: &EncodeRequest) -> SlidecastResult<EncodeOutput>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;

    /// Executable this backend runs, for diagnostics.
    fn program(&self) -> &str {
        self.name()
    }

    /// Human-readable command line, for logs and console output.
    fn describe(&self, request: &EncodeRequest) -> String {
        format!(
            "{} {} + {} -> {}",
            self.name(),
            request.manifest_path.display(),
            request.audio_path.display(),
            request.output_path.display()
        )
    }
}

/// Encodes through the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: String,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoder {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_ENCODER_BINARY)
    }

    /// Use a specific executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Fixed argument list for a request.
    pub fn args(request: &EncodeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(request.manifest_path.clone().into_os_string());
        args.push("-i".into());
        args.push(request.audio_path.clone().into_os_string());
        args.extend(
            [
                "-c:v".to_string(),
                VIDEO_CODEC.to_string(),
                "-c:a".to_string(),
                AUDIO_CODEC.to_string(),
                "-pix_fmt".to_string(),
                PIXEL_FORMAT.to_string(),
                "-r".to_string(),
                FRAME_RATE.to_string(),
                "-shortest".to_string(),
                "-movflags".to_string(),
                "+faststart".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(request.output_path.clone().into_os_string());
        args
    }
}

impl EncodeBackend for FfmpegEncoder {
    fn encode(&self, request: &EncodeRequest) -> SlidecastResult<EncodeOutput> {
        let args = Self::args(request);
        tracing::debug!(binary = %self.binary, args = ?args, "Running encoder");

        let started = std::time::Instant::now();
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| SlidecastError::EncoderUnavailable {
                binary: self.binary.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::info!(
            status = %output.status,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Encoder exited"
        );

        if !output.status.success() {
            return Err(SlidecastError::encoder_failure(&output.status, stdout, stderr));
        }
        Ok(EncodeOutput { stdout, stderr })
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn program(&self) -> &str {
        &self.binary
    }

    fn describe(&self, request: &EncodeRequest) -> String {
        std::iter::once(self.binary.clone())
            .chain(
                Self::args(request)
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg("command -v \"$1\" >/dev/null 2>&1")
        .arg("sh")
        .arg(binary)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
