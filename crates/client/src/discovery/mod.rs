//! Event discovery client.
//!
//! Lists upcoming events from the public discovery API (Ticketmaster
//! Discovery v2 by default) and flattens them into [`EventSummary`] values.
//!
//! # Caching
//!
//! Pages are cached in memory using `moka` (5-minute TTL), keyed by page
//! number. Events without an upstream price range get a random estimate once,
//! so the price shown stays stable while the page is cached.

mod types;

pub use types::{EventSummary, PriceRange};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::DiscoveryConfig;
use types::EventsPage;

/// Errors that can occur when listing events.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No API key is configured.
    #[error("TICKETMASTER_API_KEY is not set; event listings are unavailable")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("Discovery API returned {status}: {message}")]
    Upstream {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Response body was not the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the event discovery API.
#[derive(Clone)]
pub struct DiscoveryClient {
    inner: Arc<DiscoveryClientInner>,
}

struct DiscoveryClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    page_size: u32,
    cache: Cache<u32, Vec<EventSummary>>,
}

impl std::fmt::Debug for DiscoveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("api_key", &self.inner.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.inner.page_size)
            .finish_non_exhaustive()
    }
}

impl DiscoveryClient {
    /// Create a new discovery client.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(DiscoveryClientInner {
                client: reqwest::Client::builder().timeout(config.timeout).build()?,
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                page_size: config.page_size,
                cache,
            }),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    /// List one page of events (zero-based).
    ///
    /// A response without embedded events is an empty page.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::MissingApiKey` when no key is configured, or
    /// an HTTP/upstream/parse error.
    #[instrument(skip(self))]
    pub async fn events(&self, page: u32) -> Result<Vec<EventSummary>, DiscoveryError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(DiscoveryError::MissingApiKey)?;

        if let Some(events) = self.inner.cache.get(&page).await {
            debug!(count = events.len(), "Cache hit for events page");
            return Ok(events);
        }

        let events = self.fetch(page, api_key).await?;
        self.inner.cache.insert(page, events.clone()).await;
        Ok(events)
    }

    /// Find an event by id on the given page.
    ///
    /// # Errors
    ///
    /// Same as [`events`](Self::events).
    pub async fn find(&self, page: u32, event_id: &str) -> Result<Option<EventSummary>, DiscoveryError> {
        Ok(self
            .events(page)
            .await?
            .into_iter()
            .find(|event| event.id == event_id))
    }

    /// Drop every cached page.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    async fn fetch(&self, page: u32, api_key: &SecretString) -> Result<Vec<EventSummary>, DiscoveryError> {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("apikey", api_key.expose_secret())
            .append_pair("locale", "*")
            .append_pair("size", &self.inner.page_size.to_string())
            .append_pair("page", &page.to_string());

        debug!(endpoint = %self.inner.endpoint, "Fetching events page");
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Upstream {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        let body: EventsPage = serde_json::from_slice(&response.bytes().await?)?;
        let events: Vec<EventSummary> = body
            .into_events()
            .into_iter()
            .map(|raw| EventSummary::from_raw(raw, PriceRange::estimate))
            .collect();

        debug!(count = events.len(), "Fetched events page");
        Ok(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> DiscoveryConfig {
        DiscoveryConfig {
            endpoint: Url::parse(crate::config::DEFAULT_DISCOVERY_URL).unwrap(),
            api_key: api_key.map(SecretString::from),
            page_size: 20,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = DiscoveryClient::new(&config(None)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.events(0).await,
            Err(DiscoveryError::MissingApiKey)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = DiscoveryClient::new(&config(Some("tm_live_key_123"))).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tm_live_key_123"));
    }
}
