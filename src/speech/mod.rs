//! Text-to-speech backends.
//!
//! A [`SpeechSynthesizer`] turns one passage into encoded audio. The
//! pipeline writes the bytes into the job workspace and probes the file for
//! its real duration; `duration_hint` is informational only.

pub mod command;
pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use command::CommandSynthesizer;
pub use google::GoogleSynthesizer;

/// Container/codec of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Mp3,
    Wav,
    OggOpus,
}

impl AudioFormat {
    /// File extension used for clips of this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::OggOpus => "ogg",
        }
    }
}

/// Result of synthesizing one passage.
#[derive(Debug, Clone)]
pub struct SpeechOutput {
    /// Encoded audio bytes
    pub audio: Vec<u8>,
    pub format: AudioFormat,
    /// Backend's own length estimate, if it reports one
    pub duration_hint: Option<f64>,
}

/// Converts text to spoken audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<SpeechOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(AudioFormat::Mp3.extension(), "mp3");
        assert_eq!(AudioFormat::Wav.extension(), "wav");
        assert_eq!(AudioFormat::OggOpus.extension(), "ogg");
    }
}
