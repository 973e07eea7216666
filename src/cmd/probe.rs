use std::path::Path;

use anyhow::Result;

use storyreel::config::AppConfig;
use storyreel::MediaProber;

pub async fn cmd_probe(config: &AppConfig, file: &Path) -> Result<()> {
    let prober = MediaProber::new(config.ffmpeg.ffprobe_path.clone());
    let info = prober.probe(file).await?;

    println!("📄 {}", file.display());
    match info.dimensions {
        Some(dims) => println!(
            "   Dimensions: {}x{} (aspect {:.2})",
            dims.width,
            dims.height,
            dims.aspect_ratio()
        ),
        None => println!("   Dimensions: (audio only)"),
    }
    println!("   Duration: {:.3}s", info.duration_seconds);

    Ok(())
}
