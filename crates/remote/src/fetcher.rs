//! Entry fetchers - Network and in-process sources of remote entries

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use shared::LoadError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Source of raw entry bytes
#[async_trait]
pub trait EntryFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Fetch entries over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| LoadError::Unreachable {
                url: String::new(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

#[async_trait]
impl EntryFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                LoadError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(LoadError::Unreachable {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| LoadError::Unreachable {
            url: url.to_string(),
            reason: format!("Failed to read body: {}", e),
        })?;
        debug!(url, bytes = bytes.len(), "Fetched remote entry");
        Ok(bytes.to_vec())
    }
}

/// Entries served from memory, keyed by URL.
///
/// Used for fragments bundled with the shell and in tests.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    delay: Option<Duration>,
    requests: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, url: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        self.insert(url, source);
        self
    }

    /// Wait this long before answering each fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, url: impl Into<String>, source: impl Into<Vec<u8>>) {
        self.entries.lock().insert(url.into(), source.into());
    }

    pub fn remove(&self, url: &str) -> bool {
        self.entries.lock().remove(url).is_some()
    }

    /// Number of fetches served or refused so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.entries
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::Unreachable {
                url: url.to_string(),
                reason: "No entry served at this URL".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LoadErrorKind;

    #[tokio::test]
    async fn test_static_fetcher_serves_and_counts() {
        let fetcher = StaticFetcher::new().with_entry("http://a/remoteEntry.json", "{}");

        assert_eq!(fetcher.fetch("http://a/remoteEntry.json").await.unwrap(), b"{}");
        let err = fetcher.fetch("http://b/remoteEntry.json").await.unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Unreachable);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_http_fetcher_unreachable_origin() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let url = format!("http://{}/remoteEntry.json", addr);
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err.kind(), LoadErrorKind::Unreachable);
        assert_eq!(err.url(), url);
    }
}
