//! ffmpeg compositor for narrated card videos
//!
//! Two stages:
//! - **Narration mux** - concatenate the clips in one `concat` filter, then
//!   lay the track over the background, capped to the shorter stream
//! - **Card overlay** - chain one time-gated overlay per card in a single
//!   filter graph

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{run_ffmpeg, tool_available, FfmpegConfig};
use crate::error::{RenderError, Result};
use crate::timing::TimedOverlay;
use crate::workspace::ScratchFile;

/// ffmpeg-based compositor
pub struct Compositor {
    config: FfmpegConfig,
}

impl Compositor {
    #[must_use]
    pub fn with_config(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Check if ffmpeg is available
    pub async fn check_available(&self) -> bool {
        tool_available(&self.config.ffmpeg_path).await
    }

    /// Build the `concat` filter joining `count` audio inputs into `[narration]`
    fn concat_filter(count: usize) -> String {
        let mut filter = String::new();
        for i in 0..count {
            let _ = write!(filter, "[{i}:a]");
        }
        let _ = write!(filter, "concat=n={count}:v=0:a=1[narration]");
        filter
    }

    fn concat_args(&self, clips: &[PathBuf], output: &Path) -> Vec<String> {
        let mut args = self.config.base_args();

        for clip in clips {
            args.push("-i".to_string());
            args.push(clip.to_string_lossy().to_string());
        }

        args.extend([
            "-filter_complex".to_string(),
            Self::concat_filter(clips.len()),
            "-map".to_string(),
            "[narration]".to_string(),
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }

    fn mux_args(&self, video: &Path, narration: &Path, output: &Path) -> Vec<String> {
        let mut args = self.config.base_args();
        args.extend([
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            narration.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-shortest".to_string(),
            output.to_string_lossy().to_string(),
        ]);
        args
    }

    /// Build the overlay chain; returns the filter graph and its output label
    fn overlay_filter(overlays: &[TimedOverlay]) -> (String, String) {
        let mut chains = Vec::with_capacity(overlays.len());
        let mut previous = "0:v".to_string();

        for (i, overlay) in overlays.iter().enumerate() {
            let label = format!("v{}", i + 1);
            chains.push(format!(
                "[{previous}][{input}:v]overlay=0:0:enable='gte(t,{start:.3})*lt(t,{end:.3})'[{label}]",
                input = i + 1,
                start = overlay.start_seconds,
                end = overlay.end_seconds,
            ));
            previous = label;
        }

        (chains.join(";"), previous)
    }

    fn overlay_args(&self, video: &Path, overlays: &[TimedOverlay], output: &Path) -> Vec<String> {
        let mut args = self.config.base_args();

        args.push("-i".to_string());
        args.push(video.to_string_lossy().to_string());
        for overlay in overlays {
            args.push("-i".to_string());
            args.push(overlay.path.to_string_lossy().to_string());
        }

        let (filter, last) = Self::overlay_filter(overlays);
        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            format!("[{last}]"),
            "-map".to_string(),
            "0:a:0".to_string(),
        ]);
        args.extend(self.config.encode_args());
        args.extend([
            "-c:a".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Lay the concatenated `clips` over `video`, writing `output`.
    ///
    /// The joined narration track is an intermediate file next to `output`
    /// and is removed whether or not the mux succeeds.
    pub async fn narrate(&self, video: &Path, clips: &[PathBuf], output: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(RenderError::composition("narration mux", "no audio clips"));
        }

        let narration = ScratchFile::new(output.with_extension("narration.m4a"));

        info!(clips = clips.len(), "Concatenating narration");
        run_ffmpeg(
            &self.config,
            &self.concat_args(clips, narration.path()),
            "narration concat",
        )
        .await?;

        info!("Muxing narration onto background");
        run_ffmpeg(
            &self.config,
            &self.mux_args(video, narration.path(), output),
            "narration mux",
        )
        .await
    }

    /// Burn every card into `video` during its window, writing `output`.
    pub async fn overlay_cards(
        &self,
        video: &Path,
        overlays: &[TimedOverlay],
        output: &Path,
    ) -> Result<()> {
        if overlays.is_empty() {
            return Err(RenderError::composition("card overlay", "no overlays"));
        }

        info!(cards = overlays.len(), "Overlaying cards");
        run_ffmpeg(
            &self.config,
            &self.overlay_args(video, overlays, output),
            "card overlay",
        )
        .await?;

        info!("Composited video to {:?}", output);
        Ok(())
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::with_config(FfmpegConfig::default())
    }
}
