//! Spoken-duration estimation and greedy content budgeting
//!
//! The estimate is a character-rate model. It only decides *which* segments
//! get narrated; final timing always comes from probing the synthesized
//! audio.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Default narration rate, measured against the Google TTS voices
pub const DEFAULT_CHARS_PER_SECOND: f64 = 17.19;

/// Default transition overhead between consecutive cards
pub const DEFAULT_SPACING_SECS: f64 = 0.25;

/// Minimum number of segments for a usable video (lead + one reply)
pub const MIN_SEGMENTS: usize = 2;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?|ftp)://\S+").expect("valid link regex"));

/// One passage of source text. Index 0 is the lead/title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl TextSegment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            author: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Estimated spoken duration of `text` at `chars_per_second`.
pub fn estimate_duration(text: &str, chars_per_second: f64) -> f64 {
    text.chars().count() as f64 / chars_per_second
}

/// Remove URLs from narration text; synthesized voices read them out verbatim.
pub fn strip_links(text: &str) -> String {
    LINK_RE
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of a budgeting pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Accepted prefix, in input order
    pub segments: Vec<TextSegment>,
    /// Estimated consumption including spacing
    pub estimated_secs: f64,
    /// Number of segments offered
    pub offered: usize,
}

/// Greedy prefix selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budgeter {
    pub time_budget_secs: f64,
    pub chars_per_second: f64,
    pub spacing_secs: f64,
}

impl Default for Budgeter {
    fn default() -> Self {
        Self {
            time_budget_secs: 50.0,
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
            spacing_secs: DEFAULT_SPACING_SECS,
        }
    }
}

impl Budgeter {
    pub fn new(time_budget_secs: f64, chars_per_second: f64) -> Self {
        Self {
            time_budget_secs,
            chars_per_second,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_spacing(mut self, spacing_secs: f64) -> Self {
        self.spacing_secs = spacing_secs;
        self
    }

    /// Longest prefix whose estimated duration plus spacing fits the budget.
    ///
    /// Stops at the first segment that would overflow, even if later ones
    /// are short enough to fit.
    pub fn fitting_prefix(&self, segments: &[TextSegment]) -> Selection {
        let mut consumed = 0.0;
        let mut accepted = 0;

        for segment in segments {
            let spacing = if accepted == 0 { 0.0 } else { self.spacing_secs };
            let next = consumed + spacing + estimate_duration(&segment.text, self.chars_per_second);
            if next > self.time_budget_secs {
                break;
            }
            consumed = next;
            accepted += 1;
        }

        Selection {
            segments: segments[..accepted].to_vec(),
            estimated_secs: consumed,
            offered: segments.len(),
        }
    }

    /// Like [`fitting_prefix`](Self::fitting_prefix) but rejects selections
    /// shorter than [`MIN_SEGMENTS`].
    pub fn select(&self, segments: &[TextSegment]) -> Result<Selection> {
        if !self.chars_per_second.is_finite() || self.chars_per_second <= 0.0 {
            return Err(RenderError::Config(format!(
                "chars_per_second must be positive, got {}",
                self.chars_per_second
            )));
        }
        if !self.time_budget_secs.is_finite() || self.time_budget_secs <= 0.0 {
            return Err(RenderError::Config(format!(
                "time budget must be a positive number of seconds, got {}",
                self.time_budget_secs
            )));
        }

        let selection = self.fitting_prefix(segments);
        if selection.segments.len() < MIN_SEGMENTS {
            return Err(RenderError::InsufficientContent {
                selected: selection.segments.len(),
                offered: selection.offered,
            });
        }

        tracing::debug!(
            selected = selection.segments.len(),
            offered = selection.offered,
            estimated_secs = selection.estimated_secs,
            "Budgeted segments"
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(lengths: &[usize]) -> Vec<TextSegment> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &n)| TextSegment::new(i, "x".repeat(n)))
            .collect()
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        assert!((estimate_duration("abcdefghij", 10.0) - 1.0).abs() < f64::EPSILON);
        assert!((estimate_duration("ääääääääää", 10.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spacing_penalty_scenario() {
        // 3s + 0.25 + 2s = 5.25 fits; another 0.25 + 2s would reach 7.5
        let budgeter = Budgeter::new(6.0, 10.0).with_spacing(0.25);
        let selection = budgeter.select(&segments(&[30, 20, 20])).unwrap();

        assert_eq!(selection.segments.len(), 2);
        assert_eq!(selection.segments[0].index, 0);
        assert_eq!(selection.segments[1].index, 1);
        assert!((selection.estimated_secs - 5.25).abs() < 1e-9);
        assert_eq!(selection.offered, 3);
    }

    #[test]
    fn test_stops_at_first_overflow() {
        let budgeter = Budgeter::new(6.0, 10.0).with_spacing(0.0);
        // The third segment overflows; the tiny fourth would fit but is dropped
        let selection = budgeter.fitting_prefix(&segments(&[20, 20, 30, 1]));
        assert_eq!(selection.segments.len(), 2);
    }

    #[test]
    fn test_single_segment_is_insufficient() {
        let budgeter = Budgeter::new(3.0, 10.0);
        let err = budgeter.select(&segments(&[25, 25])).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InsufficientContent {
                selected: 1,
                offered: 2
            }
        ));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let budgeter = Budgeter::new(30.0, 0.0);
        assert!(matches!(
            budgeter.select(&segments(&[1, 1])),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unbounded_budget() {
        for budget in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            let budgeter = Budgeter::new(budget, 10.0);
            assert!(
                matches!(budgeter.select(&segments(&[100, 100, 100])), Err(RenderError::Config(_))),
                "budget {budget} accepted"
            );
        }
    }

    #[test]
    fn test_selection_is_prefix_and_monotonic() {
        // Deterministic pseudo-random inputs
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..200 {
            let len = (next() % 12) as usize + 1;
            let lengths: Vec<usize> = (0..len).map(|_| (next() % 120) as usize + 1).collect();
            let budget = (next() % 40) as f64 + 1.0;
            let budgeter = Budgeter::new(budget, 12.0);

            let input = segments(&lengths);
            let full = budgeter.fitting_prefix(&input);
            assert_eq!(full.segments[..], input[..full.segments.len()]);
            assert!(full.estimated_secs <= budget);

            let shorter = budgeter.fitting_prefix(&input[..input.len() - 1]);
            assert!(shorter.segments.len() <= full.segments.len());
        }
    }

    #[test]
    fn test_strip_links() {
        assert_eq!(
            strip_links("see https://example.com/a?b=c for details"),
            "see for details"
        );
        assert_eq!(strip_links("ftp://files.example.org\nhello"), "hello");
        assert_eq!(strip_links("no links here"), "no links here");
    }
}
