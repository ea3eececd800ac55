//! End-to-end render: load, stage, encode, finalize.
//!
//! ```text
//! Loading → Staging → Encoding ─┬─ Finalizing → Done
//!                               └─ CleaningUp → Failed
//! ```
//!
//! Staged files are removed on every path once staging has begun.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::job::JobDescriptor;
use slidecast_job_model::metadata::{OutputMetadata, METADATA_FILE_NAME};
use slidecast_job_model::naming::output_file_name;

use crate::encoder::{EncodeBackend, EncodeRequest};
use crate::manifest::ConcatManifest;
use crate::staging::StagingArea;

/// Where a render reads from and writes to.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Job description file.
    pub input_path: PathBuf,

    /// Directory receiving the video and `metadata.json`. Created if absent.
    pub output_dir: PathBuf,

    /// Parent of the per-run working directory; system temp dir if `None`.
    pub work_dir_parent: Option<PathBuf>,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Loading,
    Staging,
    Encoding,
    Finalizing,
    Done,
    CleaningUp,
    Failed,
}

/// Progress notifications emitted during a render.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Entered a new stage.
    Stage(PipelineStage),

    /// The job file was parsed.
    JobLoaded {
        title: String,
        images: usize,
        duration_secs: f64,
        seconds_per_image: f64,
    },

    /// All assets and the manifest are on disk.
    AssetsStaged { images: usize },

    /// The encoder is about to run.
    EncoderStarted { command_line: String },
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(PipelineEvent) + Send>;

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// The produced video.
    pub video_path: PathBuf,

    /// The metadata sidecar.
    pub metadata_path: PathBuf,

    /// Contents of the sidecar.
    pub metadata: OutputMetadata,
}

/// Load the job file named by `request` and render it.
pub fn render_slideshow(
    request: &RenderRequest,
    backend: &dyn EncodeBackend,
    progress: Option<ProgressCallback>,
) -> SlidecastResult<RenderOutcome> {
    tracing::info!(input = %request.input_path.display(), "Starting render");
    emit(&progress, PipelineEvent::Stage(PipelineStage::Loading));

    let job = match JobDescriptor::load(&request.input_path) {
        Ok(job) => job,
        Err(err) => {
            emit(&progress, PipelineEvent::Stage(PipelineStage::Failed));
            return Err(err);
        }
    };
    emit(
        &progress,
        PipelineEvent::JobLoaded {
            title: job.title.clone(),
            images: job.image_count(),
            duration_secs: job.duration_secs,
            seconds_per_image: job.seconds_per_image(),
        },
    );

    render_job(&job, request, backend, progress)
}

/// Render an already loaded job.
pub fn render_job(
    job: &JobDescriptor,
    request: &RenderRequest,
    backend: &dyn EncodeBackend,
    progress: Option<ProgressCallback>,
) -> SlidecastResult<RenderOutcome> {
    if !backend.is_available() {
        emit(&progress, PipelineEvent::Stage(PipelineStage::Failed));
        return Err(SlidecastError::EncoderUnavailable {
            binary: backend.program().to_string(),
            message: "not found or not executable".to_string(),
        });
    }

    if let Err(e) = std::fs::create_dir_all(&request.output_dir) {
        emit(&progress, PipelineEvent::Stage(PipelineStage::Failed));
        return Err(SlidecastError::Io(e));
    }
    let file_name = output_file_name(&job.filename);

    emit(&progress, PipelineEvent::Stage(PipelineStage::Staging));
    let staging = match &request.work_dir_parent {
        Some(parent) => StagingArea::create_in(parent),
        None => StagingArea::create(),
    };
    let mut staging = match staging {
        Ok(staging) => staging,
        Err(err) => {
            emit(&progress, PipelineEvent::Stage(PipelineStage::Failed));
            return Err(err);
        }
    };

    let mut run = RunState::default();
    let result = stage_encode_finalize(
        job,
        &mut staging,
        &request.output_dir,
        &file_name,
        backend,
        &progress,
        &mut run,
    );

    match result {
        Ok(outcome) => {
            if let Err(e) = staging.cleanup() {
                tracing::warn!(error = %e, "Render succeeded but staging cleanup failed");
            }
            emit(&progress, PipelineEvent::Stage(PipelineStage::Done));
            tracing::info!(
                output = %outcome.video_path.display(),
                size_bytes = outcome.metadata.size_bytes,
                "Render finished"
            );
            Ok(outcome)
        }
        Err(err) => {
            emit(&progress, PipelineEvent::Stage(PipelineStage::CleaningUp));
            if let Err(e) = staging.cleanup() {
                tracing::warn!(error = %e, "Staging cleanup after failure failed");
            }
            if run.encoder_started {
                discard_partial_output(&request.output_dir, &file_name, run.prior_output);
            }
            emit(&progress, PipelineEvent::Stage(PipelineStage::Failed));
            tracing::error!(error = %err, "Render failed");
            Err(err)
        }
    }
}

#[derive(Debug, Default)]
struct RunState {
    encoder_started: bool,
    /// State of the output file just before the encoder ran.
    prior_output: Option<OutputFingerprint>,
}

/// Enough of a file's metadata to tell whether someone rewrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputFingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl OutputFingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

fn stage_encode_finalize(
    job: &JobDescriptor,
    staging: &mut StagingArea,
    output_dir: &Path,
    file_name: &str,
    backend: &dyn EncodeBackend,
    progress: &Option<ProgressCallback>,
    run: &mut RunState,
) -> SlidecastResult<RenderOutcome> {
    let audio_path = staging.stage_audio(&job.audio)?;
    let images = staging.stage_images(&job.images)?.to_vec();
    let manifest = ConcatManifest::build(&images, job.duration_secs)?;
    let manifest_path = staging.write_manifest(&manifest)?;
    tracing::info!(
        images = images.len(),
        seconds_per_image = manifest.seconds_per_image(),
        declared_secs = manifest.declared_duration_secs(),
        work_dir = %staging.root().display(),
        "Assets staged"
    );
    emit(
        progress,
        PipelineEvent::AssetsStaged {
            images: images.len(),
        },
    );

    let output_path = output_dir.join(file_name);
    let request = EncodeRequest {
        manifest_path,
        audio_path,
        output_path,
    };
    let command_line = backend.describe(&request);
    tracing::info!(backend = backend.name(), command = %command_line, "Encoding");
    emit(progress, PipelineEvent::Stage(PipelineStage::Encoding));
    emit(progress, PipelineEvent::EncoderStarted { command_line });

    run.prior_output = OutputFingerprint::of(&request.output_path);
    run.encoder_started = true;
    let output = backend.encode(&request)?;
    tracing::debug!(stdout = %output.stdout, stderr = %output.stderr, "Encoder output");

    emit(progress, PipelineEvent::Stage(PipelineStage::Finalizing));
    let size_bytes = std::fs::metadata(&request.output_path)?.len();
    let metadata = OutputMetadata::new(file_name, size_bytes, job);
    let metadata_path = metadata.save(output_dir)?;

    Ok(RenderOutcome {
        video_path: request.output_path,
        metadata_path,
        metadata,
    })
}

/// Remove output this run wrote. A video left untouched by a failed encode
/// belongs to an earlier render and stays, along with its sidecar.
fn discard_partial_output(
    output_dir: &Path,
    file_name: &str,
    prior: Option<OutputFingerprint>,
) {
    let output_path = output_dir.join(file_name);
    let current = OutputFingerprint::of(&output_path);
    if current.is_none() || current == prior {
        return;
    }

    match std::fs::remove_file(&output_path) {
        Ok(()) => {
            tracing::info!(path = %output_path.display(), "Removed incomplete output");
        }
        Err(e) => {
            tracing::warn!(path = %output_path.display(), error = %e, "Failed to remove incomplete output");
            return;
        }
    }

    if prior.is_some() {
        discard_stale_metadata(output_dir, file_name);
    }
}

/// Drop a sidecar that still describes the video this run overwrote.
fn discard_stale_metadata(output_dir: &Path, file_name: &str) {
    let path = output_dir.join(METADATA_FILE_NAME);
    let describes_output = OutputMetadata::load(&path)
        .map(|existing| existing.filename == file_name)
        .unwrap_or(false);
    if !describes_output {
        return;
    }

    match std::fs::remove_file(&path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed stale metadata"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale metadata");
        }
    }
}

fn emit(progress: &Option<ProgressCallback>, event: PipelineEvent) {
    if let Some(cb) = progress {
        cb(event);
    }
}
