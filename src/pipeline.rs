//! Full render pipeline: budget -> speech + footage -> cards -> timing -> composite
//!
//! Orchestrates one job from passages to a delivered MP4. The workspace is
//! wiped at the start and removed at the end on every exit path; cleanup
//! failures are logged and never replace the job's own error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::budget::{Budgeter, TextSegment};
use crate::card::{self, CardImage, CardPayload, CardRenderer, DEFAULT_TEMPLATE};
use crate::error::{RenderError, Result};
use crate::footage::{
    AcquiredFootage, AcquisitionConfig, Downloader, FootageAcquirer, FootageCatalog, FootageQuery,
};
use crate::media::{AspectFitter, Compositor, FfmpegConfig, MediaDimensions, MediaProber};
use crate::speech::SpeechSynthesizer;
use crate::timing;
use crate::workspace::Workspace;

/// Settings for the render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Segment selection
    pub budget: Budgeter,
    /// Per-job scratch directory; wiped when a job starts
    pub workspace: PathBuf,
    /// HTML card template
    pub card_template: String,
    /// Minimum footage width in pixels
    pub footage_min_width: u32,
    pub ffmpeg: FfmpegConfig,
    pub acquisition: AcquisitionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            budget: Budgeter::default(),
            workspace: std::env::temp_dir().join("storyreel"),
            card_template: DEFAULT_TEMPLATE.to_string(),
            footage_min_width: 0,
            ffmpeg: FfmpegConfig::default(),
            acquisition: AcquisitionConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn target(&self) -> MediaDimensions {
        MediaDimensions::new(self.width, self.height)
    }
}

/// What to render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Ordered passages; index 0 is the lead
    pub segments: Vec<TextSegment>,
    /// Where the finished MP4 goes
    pub output: PathBuf,
    /// Footage search text; the lead passage when absent
    pub footage_query: Option<String>,
}

impl RenderRequest {
    pub fn new(segments: Vec<TextSegment>, output: impl Into<PathBuf>) -> Self {
        Self {
            segments,
            output: output.into(),
            footage_query: None,
        }
    }

    #[must_use]
    pub fn with_footage_query(mut self, query: impl Into<String>) -> Self {
        self.footage_query = Some(query.into());
        self
    }
}

/// A budgeted job, owned by one pipeline run
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub segments: Vec<TextSegment>,
    pub offered: usize,
    pub workspace: PathBuf,
    pub target: MediaDimensions,
    pub time_budget_seconds: f64,
    pub output_path: PathBuf,
    pub footage_query: String,
}

/// Synthesized narration for one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioClip {
    pub segment_index: usize,
    pub path: PathBuf,
    /// Measured by probing, filled in after synthesis
    pub duration_seconds: f64,
}

/// Summary of a finished job
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub segments_used: usize,
    pub segments_offered: usize,
    pub total_chars: usize,
    pub narration_seconds: f64,
    /// Measured speech rate, for calibrating the budgeter
    pub chars_per_second: f64,
    pub footage_id: String,
    pub output: PathBuf,
    pub elapsed_seconds: f64,
}

/// Render pipeline over pluggable speech, footage and card backends
pub struct RenderPipeline {
    config: PipelineConfig,
    speech: Arc<dyn SpeechSynthesizer>,
    catalog: Arc<dyn FootageCatalog>,
    downloader: Arc<dyn Downloader>,
    cards: Arc<dyn CardRenderer>,
    prober: MediaProber,
    fitter: AspectFitter,
    compositor: Compositor,
}

impl RenderPipeline {
    pub fn new(
        config: PipelineConfig,
        speech: Arc<dyn SpeechSynthesizer>,
        catalog: Arc<dyn FootageCatalog>,
        downloader: Arc<dyn Downloader>,
        cards: Arc<dyn CardRenderer>,
    ) -> Self {
        let prober = MediaProber::new(config.ffmpeg.ffprobe_path.clone());
        let fitter = AspectFitter::new(config.ffmpeg.clone());
        let compositor = Compositor::with_config(config.ffmpeg.clone());

        Self {
            config,
            speech,
            catalog,
            downloader,
            cards,
            prober,
            fitter,
            compositor,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one job end to end
    #[instrument(skip(self, request), fields(segments = request.segments.len(), output = %request.output.display()))]
    pub async fn render(&self, request: RenderRequest) -> Result<RenderReport> {
        if request.segments.is_empty() {
            return Err(RenderError::EmptyJob);
        }

        let started = Instant::now();
        let workspace = Workspace::prepare(&self.config.workspace).await?;

        let result = self.run(&request, &workspace, started).await;
        workspace.teardown().await;

        match &result {
            Ok(report) => info!(
                segments = report.segments_used,
                narration_secs = report.narration_seconds,
                elapsed_secs = report.elapsed_seconds,
                "Render complete"
            ),
            Err(e) => warn!(error = %e, "Render failed"),
        }
        result
    }

    fn plan(&self, request: &RenderRequest, workspace: &Workspace) -> Result<RenderJob> {
        let selection = self.config.budget.select(&request.segments)?;
        let footage_query = request
            .footage_query
            .clone()
            .unwrap_or_else(|| selection.segments[0].text.clone());

        info!(
            selected = selection.segments.len(),
            offered = selection.offered,
            estimated_secs = selection.estimated_secs,
            "Segments budgeted"
        );

        Ok(RenderJob {
            segments: selection.segments,
            offered: selection.offered,
            workspace: workspace.root().to_path_buf(),
            target: self.config.target(),
            time_budget_seconds: self.config.budget.time_budget_secs,
            output_path: request.output.clone(),
            footage_query,
        })
    }

    async fn run(
        &self,
        request: &RenderRequest,
        workspace: &Workspace,
        started: Instant,
    ) -> Result<RenderReport> {
        let job = self.plan(request, workspace)?;

        let (mut clips, footage) = tokio::try_join!(
            self.synthesize_all(&job, workspace),
            self.acquire_footage(&job, workspace),
        )?;

        let card_images = self.render_cards(&job, workspace).await?;

        let clip_paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        let durations = self.prober.durations(&clip_paths).await?;
        for (clip, duration) in clips.iter_mut().zip(&durations) {
            clip.duration_seconds = *duration;
        }

        let image_paths: Vec<PathBuf> = card_images.iter().map(|c| c.path.clone()).collect();
        let overlays = timing::synchronize(&image_paths, &durations)?;

        let fitted = workspace.path("fitted.mp4");
        self.fitter.fit(&footage.path, &fitted, job.target).await?;

        let narrated = workspace.path("narrated.mp4");
        self.compositor.narrate(&fitted, &clip_paths, &narrated).await?;

        let composed = workspace.path("composed.mp4");
        self.compositor
            .overlay_cards(&narrated, &overlays, &composed)
            .await?;

        deliver(&composed, &job.output_path).await?;

        let total_chars: usize = job.segments.iter().map(|s| s.text.chars().count()).sum();
        let narration_seconds: f64 = durations.iter().sum();
        let chars_per_second = total_chars as f64 / narration_seconds;
        info!(
            clips = clips.len(),
            chars_per_second = %format!("{chars_per_second:.2}"),
            "Narration measured"
        );

        Ok(RenderReport {
            segments_used: job.segments.len(),
            segments_offered: job.offered,
            total_chars,
            narration_seconds,
            chars_per_second,
            footage_id: footage.candidate.id,
            output: job.output_path,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }

    async fn synthesize_all(&self, job: &RenderJob, workspace: &Workspace) -> Result<Vec<AudioClip>> {
        info!(backend = self.speech.name(), segments = job.segments.len(), "Synthesizing narration");

        try_join_all(job.segments.iter().enumerate().map(|(i, segment)| async move {
            let speech = self.speech.synthesize(&segment.text).await?;
            let path = workspace.audio_clip(i, speech.format.extension());
            tokio::fs::write(&path, &speech.audio).await?;
            debug!(segment = segment.index, hint = ?speech.duration_hint, path = %path.display(), "Clip written");

            Ok::<_, RenderError>(AudioClip {
                segment_index: segment.index,
                path,
                duration_seconds: 0.0,
            })
        }))
        .await
    }

    async fn acquire_footage(&self, job: &RenderJob, workspace: &Workspace) -> Result<AcquiredFootage> {
        let query = FootageQuery::new(job.footage_query.clone(), job.time_budget_seconds.ceil())
            .with_min_width(self.config.footage_min_width);

        let mut acquirer = FootageAcquirer::new(self.catalog.clone(), self.downloader.clone())
            .with_config(self.config.acquisition);
        acquirer.acquire(&query, &workspace.path("stock.mp4")).await
    }

    async fn render_cards(&self, job: &RenderJob, workspace: &Workspace) -> Result<Vec<CardImage>> {
        let batch: Vec<(PathBuf, CardPayload)> = job
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| (workspace.card_image(i), CardPayload::from(segment)))
            .collect();

        card::render_batch(self.cards.as_ref(), &self.config.card_template, &batch).await?;

        Ok(job
            .segments
            .iter()
            .zip(batch)
            .map(|(segment, (path, _))| CardImage {
                segment_index: segment.index,
                path,
            })
            .collect())
    }
}

/// Move the finished file out of the workspace, copying across filesystems
async fn deliver(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Err(e) = tokio::fs::rename(from, to).await {
        debug!(error = %e, "Rename failed, copying");
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }

    info!(path = %to.display(), "Output delivered");
    Ok(())
}
