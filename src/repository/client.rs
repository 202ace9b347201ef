// src/repository/client.rs

//! HTTP client for index downloads and tracker APIs
//!
//! Provides a wrapper around reqwest with retry support. `file://` URLs are
//! served from the local filesystem so mirrors on disk work unchanged.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Response body together with its headers
pub struct JsonResponse<T> {
    pub body: T,
    pub headers: HeaderMap,
}

/// HTTP client wrapper with retry support
pub struct RepositoryClient {
    client: Client,
    max_retries: u32,
}

impl RepositoryClient {
    /// Create a new repository client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Download a URL to bytes, retrying transport failures
    ///
    /// HTTP error statuses are not retried.
    pub fn download_to_bytes(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = url.strip_prefix("file://") {
            debug!("Reading {} from local filesystem", path);
            return std::fs::read(path)
                .map_err(|e| Error::DownloadError(format!("Failed to read {path}: {e}")));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let bytes = response.bytes().map_err(|e| {
                        Error::DownloadError(format!("Failed to read response from {url}: {e}"))
                    })?;
                    debug!("Downloaded {} bytes from {}", bytes.len(), url);
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Fetch attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    /// GET a JSON document, sending the given extra headers
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<JsonResponse<T>> {
        debug!("GET {}", url);

        let mut request = self.client.get(url).header("Accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let headers = response.headers().clone();
        let body = response
            .json()
            .map_err(|e| Error::ParseError(format!("Invalid JSON from {url}: {e}")))?;

        Ok(JsonResponse { body, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_reads_local_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"index bytes").unwrap();

        let client = RepositoryClient::new().unwrap();
        let url = format!("file://{}", temp.path().display());
        assert_eq!(client.download_to_bytes(&url).unwrap(), b"index bytes");
    }

    #[test]
    fn test_missing_file_url_is_download_error() {
        let client = RepositoryClient::new().unwrap();
        let err = client
            .download_to_bytes("file:///nonexistent/vitrine/APKINDEX.tar.gz")
            .unwrap_err();
        assert!(matches!(err, Error::DownloadError(_)));
    }
}
