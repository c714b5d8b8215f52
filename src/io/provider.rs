//! Page-data provider - raw fare listings for one route and date
//!
//! The provider renders the search page and returns the text of each result
//! listing. The HTTP adapter talks to a rendering service that exposes:
//!
//! `GET <url>?origin=<code>&destination=<code>&date=<date>` -> `["<listing>", ...]`

use crate::domain::error::{TrackerError, TrackerResult};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Raw listing blocks for one query. Any failure means "no data this
    /// cycle" for the route.
    async fn query(&self, origin: &str, destination: &str, date: &str)
        -> TrackerResult<Vec<String>>;
}

/// Provider backed by an HTTP page-rendering service
pub struct HttpListingProvider {
    url: String,
    client: reqwest::Client,
}

impl HttpListingProvider {
    pub fn new(url: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        info!(url = %url, timeout_ms = %timeout_ms, "provider_initialized");
        Ok(Self { url: url.to_string(), client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ListingProvider for HttpListingProvider {
    async fn query(
        &self,
        origin: &str,
        destination: &str,
        date: &str,
    ) -> TrackerResult<Vec<String>> {
        let start = Instant::now();
        let unavailable = |reason: String| TrackerError::provider(origin, destination, date, reason);

        let response = self
            .client
            .get(&self.url)
            .query(&[("origin", origin), ("destination", destination), ("date", date)])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status.as_u16())));
        }

        let listings: Vec<String> =
            response.json().await.map_err(|e| unavailable(format!("invalid body: {e}")))?;

        debug!(
            origin = %origin,
            destination = %destination,
            date = %date,
            listings = %listings.len(),
            latency_ms = %start.elapsed().as_millis(),
            "provider_query_completed"
        );
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_provider() {
        let provider = HttpListingProvider::new("http://127.0.0.1:9/listings", 500).unwrap();
        assert_eq!(provider.url(), "http://127.0.0.1:9/listings");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        // Port 9 (discard) is not expected to be listening
        let provider = HttpListingProvider::new("http://127.0.0.1:9/listings", 500).unwrap();
        let err = provider.query("NVT", "GRU", "2024-05-31").await.unwrap_err();
        match err {
            TrackerError::ProviderUnavailable { origin, destination, date, .. } => {
                assert_eq!(origin, "NVT");
                assert_eq!(destination, "GRU");
                assert_eq!(date, "2024-05-31");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
