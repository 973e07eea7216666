//! Per-job scratch space
//!
//! A [`Workspace`] is wiped and recreated when a job starts and removed when
//! it ends. [`ScratchFile`] deletes a single intermediate file when dropped,
//! so stage failures cannot leak it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Directory owned by exactly one render job
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    armed: bool,
}

impl Workspace {
    /// Remove anything left at `root` and create it empty
    pub async fn prepare(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        match fs::remove_dir_all(&root).await {
            Ok(()) => debug!(path = %root.display(), "Removed stale workspace"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&root).await?;

        info!(path = %root.display(), "Workspace ready");
        Ok(Self { root, armed: true })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn audio_clip(&self, index: usize, extension: &str) -> PathBuf {
        self.path(&format!("clip-{index}.{extension}"))
    }

    pub fn card_image(&self, index: usize) -> PathBuf {
        self.path(&format!("card-{index}.png"))
    }

    /// Best-effort removal. Failures are logged, never returned.
    pub async fn teardown(mut self) {
        self.armed = false;
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => info!(path = %self.root.display(), "Workspace removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.root.display(), error = %e, "Unable to remove workspace"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Only reached when teardown() was skipped (panic or early return)
        if self.armed {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %self.root.display(), error = %e, "Unable to remove workspace");
                }
            }
        }
    }
}

/// Intermediate file removed when the guard goes out of scope
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Unable to delete file"),
        }
    }
}
