//! Audio-driven card timing
//!
//! Turns measured clip durations into back-to-back overlay windows.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Window during which a card image is visible, `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedOverlay {
    pub path: PathBuf,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimedOverlay {
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Contiguous `[start, end)` windows for `durations`, starting at 0.
pub fn intervals(durations: &[f64]) -> Result<Vec<(f64, f64)>> {
    if durations.is_empty() {
        return Err(RenderError::Timing("no durations given".to_string()));
    }

    let mut elapsed = 0.0;
    durations
        .iter()
        .enumerate()
        .map(|(i, &duration)| {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(RenderError::Timing(format!(
                    "clip {i} has non-positive duration {duration}"
                )));
            }
            let start = elapsed;
            elapsed += duration;
            Ok((start, elapsed))
        })
        .collect()
}

/// Pair each card image with the window of its narration clip.
pub fn synchronize(images: &[PathBuf], durations: &[f64]) -> Result<Vec<TimedOverlay>> {
    if images.len() != durations.len() {
        return Err(RenderError::Timing(format!(
            "{} images but {} audio durations",
            images.len(),
            durations.len()
        )));
    }

    Ok(intervals(durations)?
        .into_iter()
        .zip(images)
        .map(|((start_seconds, end_seconds), path)| TimedOverlay {
            path: path.clone(),
            start_seconds,
            end_seconds,
        })
        .collect())
}
