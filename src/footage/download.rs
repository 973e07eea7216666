//! Streaming HTTP downloader

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

use super::Downloader;
use crate::error::{RenderError, Result};
use crate::http_client::HttpClient;

/// Downloads over HTTP(S), streaming the body to disk
pub struct HttpDownloader {
    client: HttpClient,
}

impl HttpDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn failure(uri: &str, message: impl ToString) -> RenderError {
        RenderError::Download {
            uri: uri.to_string(),
            message: message.to_string(),
        }
    }

    fn validate(uri: &str) -> Result<Url> {
        let url = Url::parse(uri).map_err(|e| Self::failure(uri, e))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Self::failure(uri, format!("unsupported scheme '{other}'"))),
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(skip(self, destination), fields(uri = %uri))]
    async fn download(&self, uri: &str, destination: &Path) -> Result<()> {
        let url = Self::validate(uri)?;
        let response = self
            .client
            .get(url.as_str())
            .await
            .map_err(|e| Self::failure(uri, e))?;

        let file = tokio::fs::File::create(destination).await?;
        let mut writer = tokio::io::BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::failure(uri, e))?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        if written == 0 {
            return Err(Self::failure(uri, "empty response body"));
        }

        debug!(bytes = written, path = %destination.display(), "Downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_http() {
        assert!(HttpDownloader::validate("https://videos.example.com/a.mp4").is_ok());
        assert!(matches!(
            HttpDownloader::validate("ftp://example.com/a.mp4"),
            Err(RenderError::Download { .. })
        ));
        assert!(HttpDownloader::validate("not a uri").is_err());
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stock.mp4");
        let downloader = HttpDownloader::new(HttpClient::new().unwrap());

        let err = downloader.download("file:///etc/passwd", &dest).await.unwrap_err();
        assert!(matches!(err, RenderError::Download { .. }));
        assert!(!dest.exists());
    }
}
