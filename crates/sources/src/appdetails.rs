//! Steam store `appdetails` client with retry and a run-scoped name cache.
//!
//! The upstream API is rate-limited, so lookups retry with exponential
//! backoff and results are cached per run keyed by app id. The cache is
//! an explicit object passed into discovery rather than hidden global
//! state, so test runs stay isolated.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

use gamesphere_common::RetryPolicy;
use tracing::debug;

use crate::SourceError;

const DEFAULT_BASE_URL: &str = "https://store.steampowered.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Steam store `appdetails` endpoint.
pub struct AppDetailsClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl AppDetailsClient {
    /// Creates a client with the default retry policy (3 attempts).
    pub fn new() -> Result<Self, SourceError> {
        Self::with_retry(RetryPolicy::default())
    }

    /// Creates a client with a custom retry policy.
    pub fn with_retry(retry: RetryPolicy) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry,
        })
    }

    /// Points the client at a local server instead of the Steam store.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Resolves an app id to its store display name.
    ///
    /// Returns `Ok(None)` when the store has no entry for the id or the
    /// response carries no success flag; absence is not an error.
    /// Transient HTTP failures are retried per the client's policy.
    pub async fn app_name(&self, app_id: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/api/appdetails?appids={app_id}", self.base_url);

        self.retry
            .run("steam name lookup", || {
                let url = url.clone();
                async move {
                    let resp = self
                        .http
                        .get(&url)
                        .send()
                        .await
                        .map_err(|e| SourceError::Http(e.to_string()))?;

                    let status = resp.status();
                    if !status.is_success() {
                        return Err(SourceError::Http(format!(
                            "appdetails returned status {status}"
                        )));
                    }

                    let body: serde_json::Value = resp
                        .json()
                        .await
                        .map_err(|e| SourceError::Http(e.to_string()))?;

                    Ok(extract_name(&body, app_id))
                }
            })
            .await
    }
}

/// Pulls the game name out of an appdetails response body.
///
/// Shape: `{ "<id>": { "success": true, "data": { "name": "..." } } }`.
fn extract_name(body: &serde_json::Value, app_id: &str) -> Option<String> {
    let entry = body.get(app_id)?;
    if entry.get("success").and_then(|v| v.as_bool()) != Some(true) {
        return None;
    }
    entry
        .get("data")
        .and_then(|d| d.get("name"))
        .and_then(|n| n.as_str())
        .map(str::to_string)
}

/// Run-scoped cache of name lookups keyed by app id.
///
/// Shared across the lookup workers; a repeated id never re-fetches,
/// including ids that resolved to nothing.
#[derive(Default)]
pub struct NameCache {
    inner: Mutex<HashMap<String, Option<String>>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached lookup result, if this id was already resolved.
    pub async fn get(&self, app_id: &str) -> Option<Option<String>> {
        self.inner.lock().await.get(app_id).cloned()
    }

    /// Records a lookup result (including negative results).
    pub async fn insert(&self, app_id: &str, name: Option<String>) {
        self.inner.lock().await.insert(app_id.to_string(), name);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

/// Cache-aware lookup: consult the cache, fetch on miss, record the result.
///
/// A lookup that exhausts its retries is recorded as `None` so later
/// phases (and repeated ids) do not hammer a failing endpoint.
pub async fn lookup_name(
    client: &AppDetailsClient,
    cache: &NameCache,
    app_id: &str,
) -> Option<String> {
    if let Some(cached) = cache.get(app_id).await {
        return cached;
    }

    let name = match client.app_name(app_id).await {
        Ok(name) => name,
        Err(e) => {
            debug!(app_id, error = %e, "name lookup failed, excluding title");
            None
        }
    };

    cache.insert(app_id, name.clone()).await;
    name
}
