//! Check that the external encoder can be run.

use slidecast_common::config::AppConfig;
use slidecast_render_engine::encoder::{EncodeBackend, FfmpegEncoder};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Slidecast System Check");
    println!("{}", "=".repeat(50));

    let encoder = FfmpegEncoder::with_binary(config.encoder.binary.clone());
    if encoder.is_available() {
        println!("[OK] Encoder: {}", encoder.binary());
        println!("\nSlidecast is ready.");
        Ok(())
    } else {
        println!("[MISSING] Encoder: {}", encoder.binary());
        println!("     Install ffmpeg or set encoder.binary in the config file.");
        anyhow::bail!("encoder {} is not available", encoder.binary())
    }
}
