//! Configuration loaded from `~/.config/storyreel/config.toml`.
//!
//! Every key is optional. API keys fall back to the `PEXELS_KEY` and
//! `GOOGLE_API_KEY` environment variables and are never written back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::budget::{Budgeter, DEFAULT_CHARS_PER_SECOND, DEFAULT_SPACING_SECS};
use crate::card::{chrome, ChromeCardRenderer, DEFAULT_TEMPLATE};
use crate::footage::{AcquisitionConfig, PexelsCatalog};
use crate::http_client::HttpClient;
use crate::media::FfmpegConfig;
use crate::pipeline::PipelineConfig;
use crate::speech::google::GoogleVoice;
use crate::speech::{AudioFormat, CommandSynthesizer, GoogleSynthesizer, SpeechSynthesizer};

const PEXELS_KEY_ENV: &str = "PEXELS_KEY";
const GOOGLE_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderSection,
    pub ffmpeg: FfmpegConfig,
    pub footage: FootageSection,
    pub speech: SpeechSection,
    pub cards: CardsSection,
}

/// `[render]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub width: u32,
    pub height: u32,
    pub time_budget_secs: f64,
    pub chars_per_second: f64,
    pub segment_spacing_secs: f64,
    /// Scratch directory, wiped at the start of every job
    pub workspace: Option<PathBuf>,
    /// HTML template replacing the bundled card
    pub card_template: Option<PathBuf>,
    /// Parent for card pages and synthesizer output; the system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            time_budget_secs: 50.0,
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
            segment_spacing_secs: DEFAULT_SPACING_SECS,
            workspace: None,
            card_template: None,
            scratch_dir: None,
        }
    }
}

/// `[footage]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FootageSection {
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub max_uris_per_candidate: usize,
    pub min_width: u32,
    pub per_page: u32,
    /// `landscape`, `portrait` or `square`
    pub orientation: Option<String>,
}

impl Default for FootageSection {
    fn default() -> Self {
        let acquisition = AcquisitionConfig::default();
        Self {
            api_key: None,
            max_attempts: acquisition.max_attempts,
            max_uris_per_candidate: acquisition.max_uris_per_candidate,
            min_width: 0,
            per_page: 15,
            orientation: None,
        }
    }
}

/// Which speech backend narrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    #[default]
    Google,
    Command,
}

/// `[speech]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    pub backend: SpeechBackend,
    /// Google Cloud API key
    pub api_key: Option<String>,
    pub language_code: String,
    pub voice_name: Option<String>,
    pub ssml_gender: Option<String>,
    /// Command backend: program reading text on stdin
    pub program: String,
    /// Command backend arguments; `{output}` is the audio file to write
    pub args: Vec<String>,
    /// Command backend output format
    pub format: AudioFormat,
}

impl Default for SpeechSection {
    fn default() -> Self {
        let voice = GoogleVoice::default();
        Self {
            backend: SpeechBackend::Google,
            api_key: None,
            language_code: voice.language_code,
            voice_name: voice.name,
            ssml_gender: voice.ssml_gender,
            program: "piper".to_string(),
            args: vec!["--output_file".to_string(), "{output}".to_string()],
            format: AudioFormat::Wav,
        }
    }
}

/// `[cards]`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CardsSection {
    /// Chromium-family browser; detected when unset
    pub browser_path: Option<PathBuf>,
}

/// Return the path to the default config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyreel")
        .join("config.toml")
}

/// Load configuration from `path`, or from [`config_path`] when `None`.
///
/// A missing default file yields defaults; a missing explicit file is an
/// error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path(), false),
    };

    if !path.exists() {
        if explicit {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
}

impl AppConfig {
    /// Pexels key from the file, else the environment
    pub fn pexels_key(&self) -> Option<String> {
        self.footage
            .api_key
            .clone()
            .or_else(|| std::env::var(PEXELS_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }

    /// Google key from the file, else the environment
    pub fn google_key(&self) -> Option<String> {
        self.speech
            .api_key
            .clone()
            .or_else(|| std::env::var(GOOGLE_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }

    pub fn acquisition(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            max_attempts: self.footage.max_attempts,
            max_uris_per_candidate: self.footage.max_uris_per_candidate,
            ..AcquisitionConfig::default()
        }
    }

    /// `[ffmpeg]` with `hwaccel` applied. The hardware encoder replaces the
    /// default `libx264` only; an explicitly configured codec is kept.
    pub fn ffmpeg_config(&self) -> FfmpegConfig {
        match self.ffmpeg.hwaccel.as_deref() {
            Some(accel) if self.ffmpeg.video_codec == FfmpegConfig::default().video_codec => {
                self.ffmpeg.clone().with_hwaccel(accel)
            }
            _ => self.ffmpeg.clone(),
        }
    }

    pub fn budgeter(&self) -> Budgeter {
        Budgeter::new(self.render.time_budget_secs, self.render.chars_per_second)
            .with_spacing(self.render.segment_spacing_secs)
    }

    /// Build pipeline settings, reading the card template if one is configured.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let card_template = match &self.render.card_template {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read card template {}", path.display()))?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let mut config = PipelineConfig {
            width: self.render.width,
            height: self.render.height,
            budget: self.budgeter(),
            card_template,
            footage_min_width: self.footage.min_width,
            ffmpeg: self.ffmpeg_config(),
            acquisition: self.acquisition(),
            ..PipelineConfig::default()
        };
        if let Some(ref workspace) = self.render.workspace {
            config.workspace.clone_from(workspace);
        }
        Ok(config)
    }

    /// Speech backend named by `[speech].backend`
    pub fn speech_backend(&self, client: &HttpClient) -> Result<Arc<dyn SpeechSynthesizer>> {
        match self.speech.backend {
            SpeechBackend::Google => {
                let key = self.google_key().with_context(|| {
                    format!("Google TTS needs [speech].api_key or {GOOGLE_KEY_ENV}")
                })?;
                let voice = GoogleVoice {
                    language_code: self.speech.language_code.clone(),
                    name: self.speech.voice_name.clone(),
                    ssml_gender: self.speech.ssml_gender.clone(),
                };
                Ok(Arc::new(
                    GoogleSynthesizer::new(client.clone(), key).with_voice(voice),
                ))
            }
            SpeechBackend::Command => {
                let mut synthesizer = CommandSynthesizer::new(
                    self.speech.program.clone(),
                    self.speech.args.clone(),
                    self.speech.format,
                );
                if let Some(ref dir) = self.render.scratch_dir {
                    synthesizer = synthesizer.with_scratch_dir(dir.clone());
                }
                Ok(Arc::new(synthesizer))
            }
        }
    }

    /// Pexels catalog, requiring a key
    pub fn footage_catalog(&self, client: &HttpClient) -> Result<PexelsCatalog> {
        let key = self
            .pexels_key()
            .with_context(|| format!("footage search needs [footage].api_key or {PEXELS_KEY_ENV}"))?;

        let mut catalog = PexelsCatalog::new(client.clone(), key).with_per_page(self.footage.per_page);
        if let Some(ref orientation) = self.footage.orientation {
            catalog = catalog.with_orientation(orientation.clone());
        }
        Ok(catalog)
    }

    /// Configured browser, or the first one found on this system
    pub fn browser_path(&self) -> Option<PathBuf> {
        self.cards.browser_path.clone().or_else(chrome::detect_browser)
    }

    /// Card renderer sized to the output frame
    pub fn card_renderer(&self) -> Result<ChromeCardRenderer> {
        let path = self
            .browser_path()
            .context("no Chromium-family browser found; set [cards].browser_path")?;
        let mut renderer = ChromeCardRenderer::new(path, self.render.width, self.render.height);
        if let Some(ref dir) = self.render.scratch_dir {
            renderer = renderer.with_scratch_root(dir.clone());
        }
        Ok(renderer)
    }
}
