//! Render pipeline errors
//!
//! Every variant is fatal to the current job. Footage acquisition retries
//! internally before surfacing [`RenderError::FootageUnavailable`] or the
//! last catalog error; nothing else is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the render pipeline and its collaborators
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("job has no segments")]
    EmptyJob,

    #[error("only {selected} of {offered} segments fit the time budget (need at least 2)")]
    InsufficientContent { selected: usize, offered: usize },

    #[error("cannot probe {path}: {message}")]
    Probe { path: PathBuf, message: String },

    #[error("invalid timing input: {0}")]
    Timing(String),

    #[error("no downloadable footage for '{query}' after {attempts} attempts")]
    FootageUnavailable { query: String, attempts: u32 },

    #[error("{stage} failed: {message}")]
    Composition { stage: &'static str, message: String },

    #[error("speech synthesis error: {0}")]
    Speech(String),

    #[error("card rendering error: {0}")]
    Card(String),

    #[error("footage catalog error: {0}")]
    Catalog(String),

    #[error("footage catalog rejected the request: {0}")]
    CatalogRejected(String),

    #[error("download of {uri} failed: {message}")]
    Download { uri: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    pub(crate) fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn composition(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Composition {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = RenderError::InsufficientContent {
            selected: 1,
            offered: 4,
        };
        assert_eq!(
            err.to_string(),
            "only 1 of 4 segments fit the time budget (need at least 2)"
        );

        let err = RenderError::FootageUnavailable {
            query: "ocean".to_string(),
            attempts: 50,
        };
        assert!(err.to_string().contains("after 50 attempts"));

        let err = RenderError::composition("narration mux", "exit status 1");
        assert_eq!(err.to_string(), "narration mux failed: exit status 1");
    }
}
