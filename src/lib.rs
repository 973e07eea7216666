//! `storyreel` - narrated vertical videos from short text passages
//!
//! # Features
//!
//! - **Budgeting**: greedy prefix selection against a spoken-time budget
//! - **Narration**: pluggable speech backends (Google Cloud TTS, local commands)
//! - **Footage**: paged stock search with bounded retry and exclusion
//! - **Compositing**: ffmpeg aspect fitting, narration mux and timed card overlays
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use storyreel::{
//!     ChromeCardRenderer, HttpClient, HttpDownloader, PexelsCatalog, PipelineConfig,
//!     RenderPipeline, RenderRequest, TextSegment,
//! };
//! use storyreel::speech::GoogleSynthesizer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HttpClient::new()?;
//!     let pipeline = RenderPipeline::new(
//!         PipelineConfig::default(),
//!         Arc::new(GoogleSynthesizer::new(client.clone(), "google-key")),
//!         Arc::new(PexelsCatalog::new(client.clone(), "pexels-key")),
//!         Arc::new(HttpDownloader::new(client)),
//!         Arc::new(ChromeCardRenderer::new("/usr/bin/chromium", 1080, 1920)),
//!     );
//!
//!     let segments = vec![
//!         TextSegment::new(0, "What is the best advice you ever got?"),
//!         TextSegment::new(1, "Measure twice, cut once."),
//!     ];
//!     let report = pipeline.render(RenderRequest::new(segments, "reel.mp4")).await?;
//!     println!("{} segments, {:.1}s", report.segments_used, report.narration_seconds);
//!     Ok(())
//! }
//! ```

pub mod budget;
pub mod card;
pub mod config;
pub mod error;
pub mod footage;
pub mod http_client;
pub mod media;
pub mod pipeline;
pub mod speech;
pub mod timing;
pub mod workspace;

pub use budget::{estimate_duration, strip_links, Budgeter, Selection, TextSegment};
pub use card::{CardPayload, CardRenderer, CardSession, ChromeCardRenderer};
pub use error::{RenderError, Result};
pub use footage::{
    FootageAcquirer, FootageCandidate, FootageCatalog, FootageQuery, HttpDownloader, PexelsCatalog,
    SearchPage,
};
pub use http_client::HttpClient;
pub use media::{AspectFitter, Compositor, FfmpegConfig, FitPlan, MediaDimensions, MediaProber};
pub use pipeline::{PipelineConfig, RenderPipeline, RenderReport, RenderRequest};
pub use speech::{AudioFormat, SpeechOutput, SpeechSynthesizer};
pub use timing::{synchronize, TimedOverlay};
pub use workspace::Workspace;

/// Version of storyreel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
