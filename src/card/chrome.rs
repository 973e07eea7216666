//! Headless Chrome/Chromium card renderer
//!
//! Each snapshot writes the filled template into the session directory and
//! asks the browser for a full-frame screenshot with a transparent default
//! background, so only the card itself covers the footage.
//!
//! The browser runs once per snapshot (`--screenshot` exits when done); a
//! session owns the profile directory those runs share, not a live browser
//! process. Closing the session removes the directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{fill_template, CardPayload, CardRenderer, CardSession};
use crate::error::{RenderError, Result};

/// Binary names tried in order when no path is configured
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "brave-browser",
    "microsoft-edge",
];

#[cfg(target_os = "macos")]
const MACOS_BROWSERS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

/// Locate a Chromium-family browser
pub fn detect_browser() -> Option<PathBuf> {
    for name in BROWSER_CANDIDATES {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    #[cfg(target_os = "macos")]
    for path in MACOS_BROWSERS {
        let path = Path::new(path);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    None
}

pub struct ChromeCardRenderer {
    browser_path: PathBuf,
    width: u32,
    height: u32,
    scratch_root: PathBuf,
}

impl ChromeCardRenderer {
    pub fn new(browser_path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            browser_path: browser_path.into(),
            width,
            height,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Parent directory for per-session profiles and pages
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }
}

#[async_trait]
impl CardRenderer for ChromeCardRenderer {
    fn name(&self) -> &str {
        "chrome"
    }

    async fn open(&self) -> Result<Box<dyn CardSession>> {
        let dir = self
            .scratch_root
            .join(format!("storyreel-cards-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(dir.join("profile")).await?;
        debug!(browser = %self.browser_path.display(), dir = %dir.display(), "Card session opened");

        Ok(Box::new(ChromeSession {
            browser_path: self.browser_path.clone(),
            width: self.width,
            height: self.height,
            dir,
            count: 0,
        }))
    }
}

struct ChromeSession {
    browser_path: PathBuf,
    width: u32,
    height: u32,
    dir: PathBuf,
    count: usize,
}

impl ChromeSession {
    fn screenshot_args(&self, page: &Path, png: &Path) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--hide-scrollbars".to_string(),
            "--force-device-scale-factor=1".to_string(),
            format!("--user-data-dir={}", self.dir.join("profile").display()),
            "--default-background-color=00000000".to_string(),
            format!("--window-size={},{}", self.width, self.height),
            format!("--screenshot={}", png.display()),
            format!("file://{}", page.display()),
        ]
    }
}

#[async_trait]
impl CardSession for ChromeSession {
    async fn snapshot(&mut self, template: &str, payload: &CardPayload) -> Result<Vec<u8>> {
        let page = self.dir.join(format!("card-{}.html", self.count));
        let png = self.dir.join(format!("card-{}.png", self.count));
        self.count += 1;

        tokio::fs::write(&page, fill_template(template, payload)?).await?;

        let args = self.screenshot_args(&page, &png);
        debug!("browser args: {:?}", args);
        let output = Command::new(&self.browser_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                RenderError::Card(format!("cannot run {}: {e}", self.browser_path.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Card(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tokio::fs::read(&png)
            .await
            .map_err(|e| RenderError::Card(format!("no screenshot produced: {e}")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "Unable to remove card session directory");
            return Err(e.into());
        }
        debug!("Card session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_args_transparent_full_frame() {
        let session = ChromeSession {
            browser_path: PathBuf::from("chromium"),
            width: 1080,
            height: 1920,
            dir: PathBuf::from("/tmp/cards"),
            count: 0,
        };
        let args = session.screenshot_args(Path::new("/tmp/cards/card-0.html"), Path::new("/tmp/cards/card-0.png"));

        assert!(args.contains(&"--default-background-color=00000000".to_string()));
        assert!(args.contains(&"--window-size=1080,1920".to_string()));
        assert!(args.contains(&"--screenshot=/tmp/cards/card-0.png".to_string()));
        assert_eq!(args.last().unwrap(), "file:///tmp/cards/card-0.html");

        let next = session.screenshot_args(Path::new("/tmp/cards/card-1.html"), Path::new("/tmp/cards/card-1.png"));
        let profile = |args: &[String]| args.iter().find(|a| a.starts_with("--user-data-dir=")).cloned();
        assert_eq!(profile(&args), Some("--user-data-dir=/tmp/cards/profile".to_string()));
        assert_eq!(profile(&args), profile(&next));
    }

    #[tokio::test]
    async fn test_session_directory_lifecycle() {
        let root = tempfile::tempdir().unwrap();
        let renderer = ChromeCardRenderer::new("/nonexistent/chromium", 1080, 1920)
            .with_scratch_root(root.path());

        let mut session = renderer.open().await.unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);

        let payload = CardPayload {
            text: "hello".to_string(),
            author: None,
        };
        let err = session.snapshot("{{text}}", &payload).await.unwrap_err();
        assert!(matches!(err, RenderError::Card(_)));

        session.close().await.unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
