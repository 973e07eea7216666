//! Media inspection via ffprobe
//!
//! Every call re-probes the file; nothing is cached.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{RenderError, Result};

/// Frame size of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
}

impl MediaDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Facts about one media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    /// Dimensions of the first video stream, if any
    pub dimensions: Option<MediaDimensions>,
    pub duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse ffprobe's `-print_format json -show_format -show_streams` output
fn parse_probe(path: &Path, stdout: &[u8]) -> Result<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| RenderError::probe(path, format!("unreadable ffprobe output: {e}")))?;

    let decodable: Vec<&FfprobeStream> = probe
        .streams
        .iter()
        .filter(|s| matches!(s.codec_type.as_deref(), Some("video" | "audio")))
        .collect();

    if decodable.is_empty() {
        return Err(RenderError::probe(path, "no decodable audio or video stream"));
    }

    let dimensions = decodable
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(MediaDimensions::new(w, h)),
            _ => None,
        });

    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            decodable
                .iter()
                .find_map(|s| s.duration.as_deref().and_then(|d| d.parse::<f64>().ok()))
        })
        .ok_or_else(|| RenderError::probe(path, "no duration reported"))?;

    Ok(MediaInfo {
        dimensions,
        duration_seconds,
    })
}

/// ffprobe wrapper
#[derive(Debug, Clone)]
pub struct MediaProber {
    ffprobe_path: String,
}

impl MediaProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Probe a file for dimensions and duration
    pub async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| RenderError::probe(path, format!("cannot run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::probe(
                path,
                format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let info = parse_probe(path, &output.stdout)?;
        debug!(path = %path.display(), ?info, "Probed media");
        Ok(info)
    }

    /// Dimensions of the first video stream
    pub async fn dimensions(&self, path: &Path) -> Result<MediaDimensions> {
        self.probe(path)
            .await?
            .dimensions
            .ok_or_else(|| RenderError::probe(path, "no video stream with dimensions"))
    }

    /// Duration in seconds
    pub async fn duration(&self, path: &Path) -> Result<f64> {
        Ok(self.probe(path).await?.duration_seconds)
    }

    /// Durations of several files, probed concurrently, in input order
    pub async fn durations(&self, paths: &[PathBuf]) -> Result<Vec<f64>> {
        try_join_all(paths.iter().map(|p| self.duration(p))).await
    }
}
