//! Pexels video search catalog

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{FootageCandidate, FootageCatalog, FootageQuery, SearchPage};
use crate::error::{RenderError, Result};
use crate::http_client::HttpClient;

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/videos/search";

pub struct PexelsCatalog {
    client: HttpClient,
    api_key: String,
    per_page: u32,
    orientation: Option<String>,
}

impl PexelsCatalog {
    pub fn new(client: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            per_page: 15,
            orientation: None,
        }
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 80);
        self
    }

    /// Restrict results to `landscape`, `portrait` or `square`
    #[must_use]
    pub fn with_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.orientation = Some(orientation.into());
        self
    }

    fn search_url(&self, query: &FootageQuery, page: u32) -> Result<Url> {
        let mut url = Url::parse(PEXELS_SEARCH_URL).map_err(|e| RenderError::Catalog(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", &query.text)
                .append_pair("min_duration", &(query.min_duration_secs.ceil() as u64).to_string())
                .append_pair("min_width", &query.min_width.to_string())
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &self.per_page.to_string());
            if let Some(ref orientation) = self.orientation {
                pairs.append_pair("orientation", orientation);
            }
        }
        Ok(url)
    }

    fn into_page(response: PexelsSearchResponse) -> SearchPage {
        let candidates = response
            .videos
            .into_iter()
            .map(|video| {
                let mut files = video.video_files;
                // mp4 first, then HD before SD; catalog order otherwise
                files.sort_by_key(|f| {
                    (
                        f.file_type.as_deref() != Some("video/mp4"),
                        f.quality.as_deref() != Some("hd"),
                    )
                });
                FootageCandidate {
                    id: video.id.to_string(),
                    width: video.width,
                    height: video.height,
                    duration_seconds: video.duration,
                    download_uris: files.into_iter().map(|f| f.link).collect(),
                }
            })
            .collect();

        SearchPage {
            candidates,
            has_next_page: response.next_page.is_some(),
        }
    }
}

#[async_trait]
impl FootageCatalog for PexelsCatalog {
    fn name(&self) -> &str {
        "pexels"
    }

    #[instrument(skip(self, query), fields(query = %query.text))]
    async fn search(&self, query: &FootageQuery, page: u32) -> Result<SearchPage> {
        let url = self.search_url(query, page)?;
        let resp = self
            .client
            .inner()
            .get(url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }

        let data: PexelsSearchResponse = resp.json().await?;
        debug!(page, videos = data.videos.len(), total = data.total_results, "Pexels results");
        Ok(Self::into_page(data))
    }
}

/// Auth failures are final; any other status may be transient
fn status_error(status: StatusCode) -> RenderError {
    let message = format!("Pexels API error: {status}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RenderError::CatalogRejected(message),
        _ => RenderError::Catalog(message),
    }
}

#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
    #[serde(default)]
    total_results: u64,
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    width: u32,
    height: u32,
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    quality: Option<String>,
    file_type: Option<String>,
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "page": 1,
        "per_page": 15,
        "total_results": 2,
        "next_page": "https://api.pexels.com/videos/search/?page=2&per_page=15&query=ocean",
        "videos": [{
            "id": 1448735,
            "width": 3840,
            "height": 2160,
            "duration": 32,
            "video_files": [
                {"id": 1, "quality": "sd", "file_type": "video/mp4", "width": 640, "height": 360, "link": "https://player.vimeo.com/sd.mp4"},
                {"id": 2, "quality": null, "file_type": "video/quicktime", "width": null, "height": null, "link": "https://player.vimeo.com/raw.mov"},
                {"id": 3, "quality": "hd", "file_type": "video/mp4", "width": 1920, "height": 1080, "link": "https://player.vimeo.com/hd.mp4"}
            ]
        }]
    }"#;

    #[test]
    fn test_response_maps_to_candidates() {
        let response: PexelsSearchResponse = serde_json::from_str(RESPONSE).unwrap();
        let page = PexelsCatalog::into_page(response);

        assert!(page.has_next_page);
        assert_eq!(page.candidates.len(), 1);
        let candidate = &page.candidates[0];
        assert_eq!(candidate.id, "1448735");
        assert_eq!(candidate.width, 3840);
        assert!((candidate.duration_seconds - 32.0).abs() < f64::EPSILON);
        assert_eq!(
            candidate.download_uris,
            [
                "https://player.vimeo.com/hd.mp4",
                "https://player.vimeo.com/sd.mp4",
                "https://player.vimeo.com/raw.mov"
            ]
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let response: PexelsSearchResponse =
            serde_json::from_str(r#"{"page": 3, "videos": []}"#).unwrap();
        let page = PexelsCatalog::into_page(response);
        assert!(!page.has_next_page);
        assert!(page.candidates.is_empty());
    }

    #[test]
    fn test_search_url() {
        let catalog = PexelsCatalog::new(HttpClient::new().unwrap(), "key")
            .with_per_page(200)
            .with_orientation("portrait");
        let query = FootageQuery::new("rainy city", 49.2).with_min_width(1080);
        let url = catalog.search_url(&query, 2).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("query"), Some("rainy city"));
        assert_eq!(get("min_duration"), Some("50"));
        assert_eq!(get("min_width"), Some("1080"));
        assert_eq!(get("page"), Some("2"));
        assert_eq!(get("per_page"), Some("80"));
        assert_eq!(get("orientation"), Some("portrait"));
    }

    #[test]
    fn test_auth_failures_are_rejections() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED),
            RenderError::CatalogRejected(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN),
            RenderError::CatalogRejected(_)
        ));
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(err, RenderError::Catalog(_)));
        assert!(err.to_string().contains("503"));
    }
}
