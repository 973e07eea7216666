use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use storyreel::config::AppConfig;
use storyreel::{FootageAcquirer, FootageQuery, HttpClient, HttpDownloader};

pub async fn cmd_footage(
    config: &AppConfig,
    query: &str,
    min_duration: f64,
    output: &Path,
) -> Result<()> {
    let client = HttpClient::new()?;
    let catalog = config.footage_catalog(&client)?;
    let downloader = HttpDownloader::new(client);

    eprintln!("🔎 Searching footage: {query} (≥ {min_duration:.0}s)");

    let mut acquirer = FootageAcquirer::new(Arc::new(catalog), Arc::new(downloader))
        .with_config(config.acquisition());
    let footage_query = FootageQuery::new(query, min_duration).with_min_width(config.footage.min_width);
    let footage = acquirer.acquire(&footage_query, output).await?;

    eprintln!("\n✅ Downloaded footage {}", footage.candidate.id);
    eprintln!(
        "   Size: {}x{}, {:.1}s",
        footage.candidate.width, footage.candidate.height, footage.candidate.duration_seconds
    );
    eprintln!("   Attempts: {}", footage.attempts);
    eprintln!("   Output: {}", footage.path.display());

    Ok(())
}
