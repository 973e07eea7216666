//! ffmpeg-backed media stages
//!
//! - **Probing** - exact dimensions and durations via ffprobe
//! - **Aspect fitting** - crop, pad or resize footage to the output frame
//! - **Compositing** - narration mux and timed card overlays

pub mod compositor;
pub mod fit;
pub mod probe;

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{RenderError, Result};

pub use compositor::Compositor;
pub use fit::{AspectFitter, FitPlan};
pub use probe::{MediaDimensions, MediaInfo, MediaProber};

/// Lines of ffmpeg stderr kept in error messages
const STDERR_TAIL_LINES: usize = 8;

/// External tool configuration shared by all media stages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Video codec for re-encoding stages
    pub video_codec: String,
    /// Encoder preset
    pub preset: String,
    /// Codec for the concatenated narration track
    pub audio_codec: String,
    /// Hardware acceleration (e.g., "videotoolbox", "cuda")
    pub hwaccel: Option<String>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: resolve_tool("ffmpeg"),
            ffprobe_path: resolve_tool("ffprobe"),
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            audio_codec: "aac".to_string(),
            hwaccel: None,
        }
    }
}

impl FfmpegConfig {
    /// Enable hardware acceleration
    #[must_use]
    pub fn with_hwaccel(mut self, accel: &str) -> Self {
        self.hwaccel = Some(accel.to_string());

        self.video_codec = match accel {
            "videotoolbox" => "h264_videotoolbox".to_string(),
            "cuda" | "nvenc" => "h264_nvenc".to_string(),
            "vaapi" => "h264_vaapi".to_string(),
            "qsv" => "h264_qsv".to_string(),
            _ => "libx264".to_string(),
        };

        self
    }

    /// Leading arguments common to every ffmpeg invocation
    pub(crate) fn base_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y"]
            .iter()
            .map(std::string::ToString::to_string)
            .collect();

        if let Some(ref accel) = self.hwaccel {
            args.push("-hwaccel".to_string());
            args.push(accel.clone());
        }

        args
    }

    /// Video encoding arguments
    pub(crate) fn encode_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }
}

/// Look a binary up in `PATH`, falling back to the bare name
pub(crate) fn resolve_tool(name: &str) -> String {
    which::which(name).map_or_else(
        |_| name.to_string(),
        |p| p.to_string_lossy().to_string(),
    )
}

/// Check if a tool answers `-version`
pub async fn tool_available(path: &str) -> bool {
    Command::new(path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run ffmpeg to completion, mapping any failure to a composition error for `stage`
pub(crate) async fn run_ffmpeg(
    config: &FfmpegConfig,
    args: &[String],
    stage: &'static str,
) -> Result<()> {
    debug!(stage, "ffmpeg args: {:?}", args);

    let output = Command::new(&config.ffmpeg_path)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| RenderError::composition(stage, format!("cannot run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RenderError::composition(
            stage,
            format!("ffmpeg exited with {}: {}", output.status, stderr_tail(&stderr)),
        ));
    }

    Ok(())
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
