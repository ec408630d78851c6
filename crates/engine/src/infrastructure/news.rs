//! News lookup client for automatic prediction resolution

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::infrastructure::ports::{NewsArticle, NewsError, NewsPort};

/// Client for a NewsAPI-compatible `everything` endpoint
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Default news API base URL.
pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";

impl NewsApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create client from environment variables.
    ///
    /// Requires `NEWS_API_KEY`; `NEWS_BASE_URL` is optional.
    pub fn from_env() -> Result<Self, NewsError> {
        let api_key = std::env::var("NEWS_API_KEY")
            .map_err(|_| NewsError::RequestFailed("NEWS_API_KEY is not set".to_string()))?;
        let base_url =
            std::env::var("NEWS_BASE_URL").unwrap_or_else(|_| DEFAULT_NEWS_BASE_URL.to_string());
        Ok(Self::new(&base_url, &api_key))
    }
}

#[async_trait]
impl NewsPort for NewsApiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, NewsError> {
        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&[
                ("q", query),
                ("sortBy", "publishedAt"),
                ("pageSize", &limit.to_string()),
            ])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| NewsError::RequestFailed(e.to_string()))?;
            return Err(NewsError::RequestFailed(error_text));
        }

        let api_response: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| NewsError::InvalidResponse(e.to_string()))?;

        Ok(api_response
            .articles
            .into_iter()
            .map(|a| NewsArticle {
                title: a.title,
                description: a.description.unwrap_or_default(),
                source: a.source.name,
                published_at: a.published_at,
                url: a.url,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    title: String,
    description: Option<String>,
    source: ApiSource,
    published_at: Option<DateTime<Utc>>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: String,
}
