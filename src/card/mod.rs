//! Text card rendering.
//!
//! A [`CardRenderer`] hands out one [`CardSession`] per batch. Sessions render
//! sequentially (`&mut self`) and are closed exactly once, after the last
//! card, whether or not rendering succeeded.

pub mod chrome;

use std::path::PathBuf;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{info, warn};

use crate::budget::TextSegment;
use crate::error::{RenderError, Result};

pub use chrome::ChromeCardRenderer;

/// Bundled card template
pub const DEFAULT_TEMPLATE: &str = include_str!("../../assets/card.html");

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(payload|text|author)\}\}").expect("valid placeholder regex")
});

/// Data made available to the card template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardPayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl From<&TextSegment> for CardPayload {
    fn from(segment: &TextSegment) -> Self {
        Self {
            text: segment.text.clone(),
            author: segment.author.clone(),
        }
    }
}

/// A rendered card written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardImage {
    pub segment_index: usize,
    pub path: PathBuf,
}

/// Produces renderer sessions
#[async_trait]
pub trait CardRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire a session for one batch of cards
    async fn open(&self) -> Result<Box<dyn CardSession>>;
}

/// A live renderer handle
#[async_trait]
pub trait CardSession: Send {
    /// Render `template` filled with `payload`, returning PNG bytes with a
    /// transparent background
    async fn snapshot(&mut self, template: &str, payload: &CardPayload) -> Result<Vec<u8>>;

    /// Release the session
    async fn close(self: Box<Self>) -> Result<()>;
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `{{payload}}` (JSON), `{{text}}` and `{{author}}` (HTML-escaped).
///
/// Placeholders are replaced in one pass over the template, so placeholder
/// syntax inside the passage itself is left as written.
pub fn fill_template(template: &str, payload: &CardPayload) -> Result<String> {
    // `</` would let payload text close the surrounding <script>
    let json = serde_json::to_string(payload)?.replace("</", "<\\/");
    let text = escape_html(&payload.text);
    let author = escape_html(payload.author.as_deref().unwrap_or(""));

    Ok(PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "payload" => json.clone(),
            "text" => text.clone(),
            _ => author.clone(),
        })
        .into_owned())
}

/// Render one card per `(path, payload)` in a single session.
///
/// The session is closed once at the end. A close failure after successful
/// rendering is logged, not returned; a rendering error takes precedence.
pub async fn render_batch(
    renderer: &dyn CardRenderer,
    template: &str,
    cards: &[(PathBuf, CardPayload)],
) -> Result<()> {
    info!(renderer = renderer.name(), cards = cards.len(), "Rendering cards");
    let mut session = renderer.open().await?;

    let mut outcome = Ok(());
    for (path, payload) in cards {
        let written = match session.snapshot(template, payload).await {
            Ok(png) if png.is_empty() => Err(RenderError::Card(format!(
                "empty snapshot for {}",
                path.display()
            ))),
            Ok(png) => tokio::fs::write(path, png).await.map_err(RenderError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            outcome = Err(e);
            break;
        }
    }

    if let Err(e) = session.close().await {
        warn!(error = %e, "Unable to close card renderer");
    }
    outcome
}
