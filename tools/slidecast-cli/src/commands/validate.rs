//! Validate a job file without encoding.

use std::path::PathBuf;

use anyhow::Context;
use slidecast_common::config::AppConfig;
use slidecast_job_model::job::JobDescriptor;
use slidecast_job_model::naming::output_file_name;

pub fn run(config: &AppConfig, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| config.input_path.clone());
    println!("Validating job at: {}", path.display());

    let job = JobDescriptor::load(&path).context("Failed to load job")?;

    println!("  Title: {}", job.title);
    println!("  Images: {}", job.image_count());
    println!(
        "  Duration: {}s, {:.2}s per image",
        job.duration_secs,
        job.seconds_per_image()
    );
    println!(
        "  Output: {}",
        config
            .output_dir
            .join(output_file_name(&job.filename))
            .display()
    );
    println!("\nJob is valid.");

    Ok(())
}
