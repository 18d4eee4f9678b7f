//! Retrieval of remote report assets (logo, attachment images).

use std::fs;
use std::time::Duration;

use log::debug;

use crate::error::FetchError;

/// Source of binary assets referenced by URL.
///
/// Implementations make a single attempt per call; retrying is left to the caller.
pub trait AssetFetcher: Sync {
    /// Returns the raw bytes found at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: AssetFetcher + ?Sized> AssetFetcher for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Fetches assets over HTTP(S); `file://` URLs are read from the local filesystem.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    fn fetch_file(path: &str) -> Result<Vec<u8>, FetchError> {
        fs::read(path).map_err(|source| FetchError::File {
            url: format!("file://{}", path),
            source,
        })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Self::fetch_file(path);
        }

        let request_error = |source| FetchError::Request {
            url: url.to_owned(),
            source,
        };

        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(request_error)?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
