//! Background footage acquisition.
//!
//! A [`FootageCatalog`] answers paged searches; a [`Downloader`] fetches one
//! URI to disk. [`FootageAcquirer`] drives both: it walks pages until a
//! usable candidate turns up, tries that candidate's URIs in order, and
//! permanently excludes candidates whose URIs all fail before searching
//! again. Attempts are bounded. A catalog that rejects the request outright
//! stops acquisition at once; one that only ever failed surfaces its last
//! error instead of [`RenderError::FootageUnavailable`].

pub mod download;
pub mod pexels;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{RenderError, Result};

pub use download::HttpDownloader;
pub use pexels::PexelsCatalog;

/// A stock clip offered by a catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootageCandidate {
    /// Catalog-specific identifier.
    pub id: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Clip length in seconds.
    pub duration_seconds: f64,
    /// Download locations in preference order.
    pub download_uris: Vec<String>,
}

/// Search criteria for background footage.
#[derive(Debug, Clone, PartialEq)]
pub struct FootageQuery {
    pub text: String,
    pub min_duration_secs: f64,
    pub min_width: u32,
}

impl FootageQuery {
    pub fn new(text: impl Into<String>, min_duration_secs: f64) -> Self {
        Self {
            text: text.into(),
            min_duration_secs,
            min_width: 0,
        }
    }

    #[must_use]
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    /// Whether `candidate` meets the minimums
    pub fn admits(&self, candidate: &FootageCandidate) -> bool {
        candidate.duration_seconds >= self.min_duration_secs && candidate.width >= self.min_width
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub candidates: Vec<FootageCandidate>,
    pub has_next_page: bool,
}

/// A searchable stock footage source.
#[async_trait]
pub trait FootageCatalog: Send + Sync {
    /// Catalog name for logs
    fn name(&self) -> &str;

    /// Fetch one page of results. Pages are numbered from 1.
    async fn search(&self, query: &FootageQuery, page: u32) -> Result<SearchPage>;
}

/// Fetches a single URI to a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Write the body at `uri` to `destination`. Fails on non-2xx or network error.
    async fn download(&self, uri: &str, destination: &Path) -> Result<()>;
}

/// Retry bounds for acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Search-and-download attempts before giving up
    pub max_attempts: u32,
    /// URIs tried per candidate within one attempt
    pub max_uris_per_candidate: usize,
    /// Pages walked within one search
    pub max_pages: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            max_uris_per_candidate: 10,
            max_pages: 100,
        }
    }
}

/// Footage that made it to disk.
#[derive(Debug, Clone, Serialize)]
pub struct AcquiredFootage {
    pub candidate: FootageCandidate,
    pub path: PathBuf,
    /// The URI that succeeded
    pub uri: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Outcome of walking the catalog once.
enum SearchOutcome {
    Found(FootageCandidate),
    Exhausted,
}

/// Drives search, download and exclusion against one catalog.
pub struct FootageAcquirer {
    catalog: Arc<dyn FootageCatalog>,
    downloader: Arc<dyn Downloader>,
    config: AcquisitionConfig,
    excluded: HashSet<String>,
}

impl FootageAcquirer {
    pub fn new(catalog: Arc<dyn FootageCatalog>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            catalog,
            downloader,
            config: AcquisitionConfig::default(),
            excluded: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AcquisitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Candidate ids that failed every tried URI
    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    /// Find and download footage for `query` into `destination`.
    pub async fn acquire(&mut self, query: &FootageQuery, destination: &Path) -> Result<AcquiredFootage> {
        info!(
            catalog = self.catalog.name(),
            query = %query.text,
            min_duration = query.min_duration_secs,
            "Acquiring footage"
        );

        let mut attempts = 0;
        let mut found_any = false;
        let mut search_error = None;
        while attempts < self.config.max_attempts {
            attempts += 1;

            let candidate = match self.search(query).await {
                Ok(SearchOutcome::Found(candidate)) => candidate,
                Ok(SearchOutcome::Exhausted) => {
                    // Every page has been seen; a retry cannot turn up anything new
                    debug!(attempts, "Catalog exhausted");
                    break;
                }
                Err(e @ RenderError::CatalogRejected(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Footage search failed");
                    search_error = Some(e);
                    continue;
                }
            };
            found_any = true;

            if let Some(uri) = self.download_any(&candidate, destination).await {
                info!(id = %candidate.id, attempts, "Footage downloaded");
                return Ok(AcquiredFootage {
                    candidate,
                    path: destination.to_path_buf(),
                    uri,
                    attempts,
                });
            }

            warn!(id = %candidate.id, attempt = attempts, "Excluding candidate, no URI downloaded");
            self.excluded.insert(candidate.id);
        }

        // A catalog that never answered is the real cause
        match search_error {
            Some(e) if !found_any => Err(e),
            _ => Err(RenderError::FootageUnavailable {
                query: query.text.clone(),
                attempts,
            }),
        }
    }

    /// Walk pages from the first until an admissible, non-excluded candidate appears
    async fn search(&self, query: &FootageQuery) -> Result<SearchOutcome> {
        let mut page = 1;
        while page <= self.config.max_pages {
            let results = self.catalog.search(query, page).await?;
            debug!(page, candidates = results.candidates.len(), "Search page");

            if let Some(candidate) = results
                .candidates
                .into_iter()
                .find(|c| query.admits(c) && !self.excluded.contains(&c.id))
            {
                return Ok(SearchOutcome::Found(candidate));
            }

            if !results.has_next_page {
                break;
            }
            page += 1;
        }
        Ok(SearchOutcome::Exhausted)
    }

    /// Try the candidate's URIs in order; the first success wins
    async fn download_any(&self, candidate: &FootageCandidate, destination: &Path) -> Option<String> {
        for uri in candidate
            .download_uris
            .iter()
            .take(self.config.max_uris_per_candidate)
        {
            match self.downloader.download(uri, destination).await {
                Ok(()) => return Some(uri.clone()),
                Err(e) => {
                    warn!(id = %candidate.id, uri = %uri, error = %e, "Download failed");
                    let _ = tokio::fs::remove_file(destination).await;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn candidate(id: &str, uris: &[&str]) -> FootageCandidate {
        FootageCandidate {
            id: id.to_string(),
            width: 1920,
            height: 1080,
            duration_seconds: 60.0,
            download_uris: uris.iter().map(|u| (*u).to_string()).collect(),
        }
    }

    /// Serves fixed pages, or an unseen candidate on every call when endless
    struct MockCatalog {
        pages: Vec<SearchPage>,
        fresh: Mutex<u32>,
        endless: bool,
    }

    impl MockCatalog {
        fn pages(pages: Vec<SearchPage>) -> Self {
            Self {
                pages,
                fresh: Mutex::new(0),
                endless: false,
            }
        }

        fn endless() -> Self {
            Self {
                pages: Vec::new(),
                fresh: Mutex::new(0),
                endless: true,
            }
        }
    }

    #[async_trait]
    impl FootageCatalog for MockCatalog {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(&self, _query: &FootageQuery, page: u32) -> Result<SearchPage> {
            if self.endless {
                let mut n = self.fresh.lock().unwrap();
                *n += 1;
                return Ok(SearchPage {
                    candidates: vec![candidate(&format!("fresh-{n}"), &["bad://x"])],
                    has_next_page: true,
                });
            }
            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }
    }

    /// Fails every search with the error built by `error`
    struct FailingCatalog {
        calls: Mutex<u32>,
        error: fn() -> RenderError,
    }

    impl FailingCatalog {
        fn new(error: fn() -> RenderError) -> Self {
            Self {
                calls: Mutex::new(0),
                error,
            }
        }
    }

    #[async_trait]
    impl FootageCatalog for FailingCatalog {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(&self, _query: &FootageQuery, _page: u32) -> Result<SearchPage> {
            *self.calls.lock().unwrap() += 1;
            Err((self.error)())
        }
    }

    /// Succeeds for URIs starting with `ok://`, records every call
    #[derive(Default)]
    struct MockDownloader {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Downloader for MockDownloader {
        async fn download(&self, uri: &str, destination: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(uri.to_string());
            if uri.starts_with("ok://") {
                tokio::fs::write(destination, b"video").await?;
                Ok(())
            } else {
                Err(RenderError::Download {
                    uri: uri.to_string(),
                    message: "HTTP 404".to_string(),
                })
            }
        }
    }

    fn acquirer(catalog: MockCatalog, downloader: Arc<MockDownloader>) -> FootageAcquirer {
        FootageAcquirer::new(Arc::new(catalog), downloader)
    }

    #[tokio::test]
    async fn test_first_working_uri_wins() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stock.mp4");
        let downloader = Arc::new(MockDownloader::default());
        let catalog = MockCatalog::pages(vec![SearchPage {
            candidates: vec![candidate("a", &["bad://1", "ok://2", "ok://3"])],
            has_next_page: false,
        }]);

        let mut acquirer = acquirer(catalog, downloader.clone());
        let footage = acquirer.acquire(&FootageQuery::new("ocean", 50.0), &dest).await.unwrap();

        assert_eq!(footage.candidate.id, "a");
        assert_eq!(footage.uri, "ok://2");
        assert_eq!(footage.attempts, 1);
        assert!(dest.exists());
        assert_eq!(*downloader.calls.lock().unwrap(), ["bad://1", "ok://2"]);
    }

    #[tokio::test]
    async fn test_failed_candidate_excluded_and_next_page_used() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(MockDownloader::default());
        let catalog = MockCatalog::pages(vec![
            SearchPage {
                candidates: vec![candidate("a", &["bad://1"])],
                has_next_page: true,
            },
            SearchPage {
                candidates: vec![candidate("b", &["ok://1"])],
                has_next_page: false,
            },
        ]);

        let mut acquirer = acquirer(catalog, downloader);
        let footage = acquirer
            .acquire(&FootageQuery::new("ocean", 50.0), &dir.path().join("stock.mp4"))
            .await
            .unwrap();

        assert_eq!(footage.candidate.id, "b");
        assert_eq!(footage.attempts, 2);
        assert!(acquirer.excluded().contains("a"));
        assert!(!acquirer.excluded().contains(&footage.candidate.id));
    }

    #[tokio::test]
    async fn test_short_or_narrow_candidates_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut short = candidate("short", &["ok://short"]);
        short.duration_seconds = 10.0;
        let mut narrow = candidate("narrow", &["ok://narrow"]);
        narrow.width = 640;
        let catalog = MockCatalog::pages(vec![SearchPage {
            candidates: vec![short, narrow, candidate("good", &["ok://good"])],
            has_next_page: false,
        }]);

        let mut acquirer = acquirer(catalog, Arc::new(MockDownloader::default()));
        let query = FootageQuery::new("ocean", 50.0).with_min_width(1280);
        let footage = acquirer.acquire(&query, &dir.path().join("stock.mp4")).await.unwrap();
        assert_eq!(footage.candidate.id, "good");
    }

    #[tokio::test]
    async fn test_only_candidate_fails_without_more_pages() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stock.mp4");
        let catalog = MockCatalog::pages(vec![SearchPage {
            candidates: vec![candidate("a", &["bad://1", "bad://2"])],
            has_next_page: false,
        }]);

        let mut acquirer = acquirer(catalog, Arc::new(MockDownloader::default()));
        let err = acquirer.acquire(&FootageQuery::new("ocean", 50.0), &dest).await.unwrap_err();

        match err {
            RenderError::FootageUnavailable { query, attempts } => {
                assert_eq!(query, "ocean");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(MockDownloader::default());
        let mut acquirer = acquirer(MockCatalog::endless(), downloader.clone());

        let err = acquirer
            .acquire(&FootageQuery::new("ocean", 50.0), &dir.path().join("stock.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::FootageUnavailable { attempts: 50, .. }));
        assert_eq!(acquirer.excluded().len(), 50);
        assert_eq!(downloader.calls.lock().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_uris_per_candidate_capped() {
        let dir = tempfile::tempdir().unwrap();
        let uris: Vec<String> = (0..15).map(|i| format!("bad://{i}")).collect();
        let uri_refs: Vec<&str> = uris.iter().map(String::as_str).collect();
        let downloader = Arc::new(MockDownloader::default());
        let catalog = MockCatalog::pages(vec![SearchPage {
            candidates: vec![candidate("a", &uri_refs)],
            has_next_page: false,
        }]);

        let mut acquirer = acquirer(catalog, downloader.clone());
        let _ = acquirer
            .acquire(&FootageQuery::new("ocean", 50.0), &dir.path().join("stock.mp4"))
            .await;

        assert_eq!(downloader.calls.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_rejected_search_stops_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FailingCatalog::new(|| {
            RenderError::CatalogRejected("Pexels API error: 401 Unauthorized".to_string())
        }));
        let downloader = Arc::new(MockDownloader::default());
        let mut acquirer = FootageAcquirer::new(catalog.clone(), downloader.clone());

        let err = acquirer
            .acquire(&FootageQuery::new("ocean", 50.0), &dir.path().join("stock.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::CatalogRejected(_)));
        assert!(err.to_string().contains("401"));
        assert_eq!(*catalog.calls.lock().unwrap(), 1);
        assert!(downloader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_search_failure_surfaces_cause() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(FailingCatalog::new(|| {
            RenderError::Catalog("Pexels API error: 503 Service Unavailable".to_string())
        }));
        let mut acquirer = FootageAcquirer::new(catalog.clone(), Arc::new(MockDownloader::default()));

        let err = acquirer
            .acquire(&FootageQuery::new("ocean", 50.0), &dir.path().join("stock.mp4"))
            .await
            .unwrap_err();

        match err {
            RenderError::Catalog(message) => assert!(message.contains("503")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*catalog.calls.lock().unwrap(), 50);
    }
}
