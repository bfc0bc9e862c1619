//! Restaurant search seam
//!
//! The fulfillment worker asks the search cluster for restaurant ids
//! matching a cuisine; full records are then hydrated from the local
//! catalog. Ranking uses a random score on top of the cuisine match so
//! repeated identical requests surface varied picks.

use crate::config::SearchConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while querying the search cluster
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Seam to the restaurant search index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Top restaurant ids for a cuisine, at most `size` of them. An empty
    /// result is not an error.
    async fn top_ids(&self, cuisine: &str, size: u32) -> Result<Vec<String>>;
}

/// HTTP client for an OpenSearch-style cluster
pub struct HttpSearchIndex {
    config: SearchConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    restaurant_id: String,
}

impl HttpSearchIndex {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn top_ids(&self, cuisine: &str, size: u32) -> Result<Vec<String>> {
        let url = format!("{}/{}/_search", self.config.base_url, self.config.index);

        // Seed the random score with the clock so consecutive requests for
        // the same cuisine don't repeat the same picks.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let payload = json!({
            "size": size,
            "query": {
                "function_score": {
                    "query": { "match": { "cuisine": cuisine } },
                    "random_score": { "seed": seed },
                    "boost_mode": "sum"
                }
            }
        });

        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&payload);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else {
                SearchError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(SearchError::AuthenticationFailed(text));
            }
            return Err(SearchError::InvalidQuery(text));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(data
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.restaurant_id)
            .collect())
    }
}
