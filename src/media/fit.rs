//! Fit background footage to the output frame
//!
//! Wider sources are center-cropped to the target proportion and then
//! resized, trading edge content for a full frame. Narrower sources are
//! padded. Sources already at the target aspect are resized directly.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::probe::{MediaDimensions, MediaProber};
use super::{run_ffmpeg, FfmpegConfig};
use crate::error::Result;
use crate::workspace::ScratchFile;

/// How a source will be brought to the target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitPlan {
    /// Center-crop to `width` x `height`, then resize
    Crop { width: u32, height: u32 },
    /// Resize inside the frame and pad the remainder
    Pad,
    /// Aspect already matches; resize only
    Resize,
}

/// Aspect ratio rounded to two decimals, as an integer for exact comparison
fn rounded_ratio(dims: MediaDimensions) -> i64 {
    (dims.aspect_ratio() * 100.0).round() as i64
}

/// Decide how to fit `source` into `target`.
pub fn plan_fit(source: MediaDimensions, target: MediaDimensions) -> FitPlan {
    let source_ratio = rounded_ratio(source);
    let target_ratio = rounded_ratio(target);

    if source_ratio > target_ratio {
        let exact = f64::from(source.height) * target.aspect_ratio();
        // Even widths keep yuv420p encoders happy
        let width = ((exact.round() as u32) & !1).max(2).min(source.width);
        FitPlan::Crop {
            width,
            height: source.height,
        }
    } else if source_ratio < target_ratio {
        FitPlan::Pad
    } else {
        FitPlan::Resize
    }
}

fn resize_filter(target: MediaDimensions, pad: bool) -> String {
    let (w, h) = (target.width, target.height);
    if pad {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1"
        )
    } else {
        format!("scale={w}:{h},setsar=1")
    }
}

/// Scratch path for the cropped intermediate next to `output`
fn crop_path(output: &Path) -> PathBuf {
    output.with_extension("crop.mp4")
}

/// Crops, pads or resizes footage with ffmpeg
pub struct AspectFitter {
    config: FfmpegConfig,
    prober: MediaProber,
}

impl AspectFitter {
    pub fn new(config: FfmpegConfig) -> Self {
        let prober = MediaProber::new(config.ffprobe_path.clone());
        Self { config, prober }
    }

    fn crop_args(&self, input: &Path, output: &Path, width: u32, height: u32) -> Vec<String> {
        let mut args = self.config.base_args();
        args.extend([
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("crop={width}:{height}"),
            "-an".to_string(),
        ]);
        args.extend(self.config.encode_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    fn resize_args(
        &self,
        input: &Path,
        output: &Path,
        target: MediaDimensions,
        pad: bool,
    ) -> Vec<String> {
        let mut args = self.config.base_args();
        args.extend([
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            resize_filter(target, pad),
            "-an".to_string(),
        ]);
        args.extend(self.config.encode_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Write `input` to `output` at exactly `target` resolution.
    pub async fn fit(&self, input: &Path, output: &Path, target: MediaDimensions) -> Result<FitPlan> {
        let source = self.prober.dimensions(input).await?;
        let plan = plan_fit(source, target);
        info!(
            source = %format!("{}x{}", source.width, source.height),
            target = %format!("{}x{}", target.width, target.height),
            ?plan,
            "Fitting footage"
        );

        match plan {
            FitPlan::Crop { width, height } => {
                let cropped = ScratchFile::new(crop_path(output));
                run_ffmpeg(
                    &self.config,
                    &self.crop_args(input, cropped.path(), width, height),
                    "center crop",
                )
                .await?;
                run_ffmpeg(
                    &self.config,
                    &self.resize_args(cropped.path(), output, target, false),
                    "resize",
                )
                .await?;
            }
            FitPlan::Pad => {
                run_ffmpeg(&self.config, &self.resize_args(input, output, target, true), "resize")
                    .await?;
            }
            FitPlan::Resize => {
                run_ffmpeg(&self.config, &self.resize_args(input, output, target, false), "resize")
                    .await?;
            }
        }

        Ok(plan)
    }
}
