//! External-command speech backend
//!
//! Runs a local synthesizer such as `piper`, passing the text on stdin. The
//! argument list may contain `{output}`, replaced with a temporary file the
//! program writes its audio to.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{AudioFormat, SpeechOutput, SpeechSynthesizer};
use crate::error::{RenderError, Result};
use crate::workspace::ScratchFile;

const OUTPUT_PLACEHOLDER: &str = "{output}";

pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    format: AudioFormat,
    scratch_dir: PathBuf,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, format: AudioFormat) -> Self {
        Self {
            program: program.into(),
            args,
            format,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the program's output files
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn expand_args(&self, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, output))
            .collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn synthesize(&self, text: &str) -> Result<SpeechOutput> {
        let output = ScratchFile::new(self.scratch_dir.join(format!(
            "speech-{}.{}",
            uuid::Uuid::new_v4(),
            self.format.extension()
        )));
        let args = self.expand_args(&output.path().to_string_lossy());
        debug!(program = %self.program, "speech args: {:?}", args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::Speech(format!("cannot run {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            // Closing stdin tells the program the text is complete
            drop(stdin);
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Speech(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let audio = tokio::fs::read(output.path())
            .await
            .map_err(|e| RenderError::Speech(format!("{} produced no audio: {e}", self.program)))?;
        if audio.is_empty() {
            return Err(RenderError::Speech(format!("{} produced no audio", self.program)));
        }

        Ok(SpeechOutput {
            audio,
            format: self.format,
            duration_hint: None,
        })
    }
}
