use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use storyreel::config::AppConfig;
use storyreel::{HttpClient, HttpDownloader, RenderPipeline, RenderRequest};

use super::load_passages;

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct RenderOverrides {
    pub budget: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub query: Option<String>,
    pub workspace: Option<PathBuf>,
    pub keep_links: bool,
    pub json: bool,
}

pub async fn cmd_render(
    config: &AppConfig,
    passages: &Path,
    output: &Path,
    overrides: RenderOverrides,
) -> Result<()> {
    let segments = load_passages(passages, overrides.keep_links)?;

    let mut config = config.clone();
    if let Some(width) = overrides.width {
        config.render.width = width;
    }
    if let Some(height) = overrides.height {
        config.render.height = height;
    }
    if let Some(budget) = overrides.budget {
        config.render.time_budget_secs = budget;
    }
    if let Some(workspace) = overrides.workspace {
        config.render.workspace = Some(workspace);
    }

    eprintln!("🎬 Rendering: {} ({} passages)", passages.display(), segments.len());
    eprintln!("   Output: {}", output.display());
    eprintln!(
        "   Frame: {}x{}, budget {:.0}s",
        config.render.width, config.render.height, config.render.time_budget_secs
    );

    let client = HttpClient::new()?;
    let pipeline = RenderPipeline::new(
        config.pipeline_config()?,
        config.speech_backend(&client)?,
        Arc::new(config.footage_catalog(&client)?),
        Arc::new(HttpDownloader::new(client)),
        Arc::new(config.card_renderer()?),
    );

    let mut request = RenderRequest::new(segments, output);
    if let Some(query) = overrides.query {
        request = request.with_footage_query(query);
    }

    let report = pipeline
        .render(request)
        .await
        .with_context(|| format!("failed to render {}", output.display()))?;

    if overrides.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!("\n✅ Render complete in {:.1}s", report.elapsed_seconds);
    eprintln!("   Output: {}", report.output.display());
    eprintln!(
        "   Passages: {} of {} ({} chars)",
        report.segments_used, report.segments_offered, report.total_chars
    );
    eprintln!(
        "   Narration: {:.1}s ({:.2} chars/s)",
        report.narration_seconds, report.chars_per_second
    );
    eprintln!("   Footage: {}", report.footage_id);

    Ok(())
}
