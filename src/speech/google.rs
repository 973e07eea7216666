//! Google Cloud Text-to-Speech over REST

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{AudioFormat, SpeechOutput, SpeechSynthesizer};
use crate::error::{RenderError, Result};
use crate::http_client::HttpClient;

const SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Voice selection for Google TTS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleVoice {
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssml_gender: Option<String>,
}

impl Default for GoogleVoice {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            name: Some("en-US-Neural2-D".to_string()),
            ssml_gender: Some("MALE".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: &'a GoogleVoice,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

pub struct GoogleSynthesizer {
    client: HttpClient,
    api_key: String,
    voice: GoogleVoice,
}

impl GoogleSynthesizer {
    pub fn new(client: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            voice: GoogleVoice::default(),
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: GoogleVoice) -> Self {
        self.voice = voice;
        self
    }

    fn request<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text },
            voice: &self.voice,
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        }
    }

    fn decode(response: SynthesizeResponse) -> Result<Vec<u8>> {
        let audio = base64::engine::general_purpose::STANDARD
            .decode(response.audio_content)
            .map_err(|e| RenderError::Speech(format!("invalid audioContent: {e}")))?;
        if audio.is_empty() {
            return Err(RenderError::Speech("empty audioContent".to_string()));
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    fn name(&self) -> &str {
        "google"
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> Result<SpeechOutput> {
        let resp = self
            .client
            .inner()
            .post(SYNTHESIZE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request(text))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RenderError::Speech(format!("Google TTS error {status}: {body}")));
        }

        let audio = Self::decode(resp.json().await?)?;
        debug!(bytes = audio.len(), "Synthesized");

        Ok(SpeechOutput {
            audio,
            format: AudioFormat::Mp3,
            duration_hint: None,
        })
    }
}
