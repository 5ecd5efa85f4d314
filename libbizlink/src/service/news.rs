//! Third-party news aggregation endpoint
//!
//! Unlike the backend services this talks to an external API with its own
//! `{status: "ok", totalResults, articles}` response shape. The API key comes
//! from configuration and is only ever placed in the query string.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::NewsConfig;
use crate::error::ApiError;
use crate::http::{classify_reqwest_error, read_body, ApiResult};
use crate::types::NewsArticle;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsResponse {
    status: String,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct NewsService {
    http: reqwest::Client,
    config: NewsConfig,
    api_key: SecretString,
}

impl NewsService {
    pub fn new(http: reqwest::Client, config: NewsConfig, api_key: SecretString) -> Self {
        Self {
            http,
            config,
            api_key,
        }
    }

    /// `GET {base}/everything?q=<topic>&sortBy=publishedAt&language=<lang>`
    pub async fn fetch_articles(&self) -> ApiResult<Vec<NewsArticle>> {
        let url = format!("{}/everything", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(topic = %self.config.topic, "Fetching news articles");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", self.config.topic.as_str()),
                ("sortBy", "publishedAt"),
                ("language", self.config.language.as_str()),
                ("apiKey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let (status, body) = read_body(response).await?;
        let parsed: NewsResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        if parsed.status != "ok" {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: parsed.message,
            });
        }

        tracing::debug!(
            total = parsed.total_results.unwrap_or_default(),
            received = parsed.articles.len(),
            "News articles received"
        );

        Ok(parsed.articles)
    }
}
