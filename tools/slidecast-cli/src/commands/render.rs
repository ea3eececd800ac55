//! Render a job file to video.

use std::path::PathBuf;

use slidecast_common::config::AppConfig;
use slidecast_common::error::SlidecastError;
use slidecast_render_engine::encoder::FfmpegEncoder;
use slidecast_render_engine::pipeline::{
    render_slideshow, PipelineEvent, PipelineStage, ProgressCallback, RenderRequest,
};

pub fn run(
    config: &AppConfig,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Starting video creation...");

    let request = RenderRequest {
        input_path: input.unwrap_or_else(|| config.input_path.clone()),
        output_dir: output_dir.unwrap_or_else(|| config.output_dir.clone()),
        work_dir_parent: None,
    };
    let encoder = FfmpegEncoder::with_binary(config.encoder.binary.clone());

    let progress_cb: ProgressCallback = Box::new(|event| match event {
        PipelineEvent::JobLoaded {
            title,
            images,
            duration_secs,
            seconds_per_image,
        } => {
            println!("Processing: {title}");
            println!("  Images: {images}");
            println!("  Duration: {duration_secs}s, {seconds_per_image:.2}s per image");
        }
        PipelineEvent::AssetsStaged { images } => println!("Saved {images} images"),
        PipelineEvent::EncoderStarted { command_line } => {
            println!("Running encoder...");
            println!("  {command_line}");
        }
        PipelineEvent::Stage(PipelineStage::CleaningUp) => {
            println!("Cleaning up temporary files...");
        }
        PipelineEvent::Stage(_) => {}
    });

    match render_slideshow(&request, &encoder, Some(progress_cb)) {
        Ok(outcome) => {
            let size_mb = outcome.metadata.size_bytes as f64 / 1024.0 / 1024.0;
            println!("Video created successfully!");
            println!("  Output: {} ({size_mb:.1}MB)", outcome.video_path.display());
            println!("  Metadata: {}", outcome.metadata_path.display());
            Ok(())
        }
        Err(SlidecastError::EncoderFailure {
            status,
            stdout,
            stderr,
            ..
        }) => {
            eprint!("{}", encoder_failure_report(&status, &stdout, &stderr));
            Err(anyhow::anyhow!("Render failed: encoder exited with {status}"))
        }
        Err(e) if e.is_encoder_failure() => {
            eprintln!("Run `slidecast check` to diagnose the encoder setup.");
            Err(anyhow::Error::new(e).context("Render failed"))
        }
        Err(e) => Err(anyhow::Error::new(e).context("Render failed")),
    }
}

/// Console report for a failed encode; the captured streams are kept as-is.
fn encoder_failure_report(status: &str, stdout: &str, stderr: &str) -> String {
    format!("Encoder failed: {status}\nstdout:\n{stdout}\nstderr:\n{stderr}\n")
}
