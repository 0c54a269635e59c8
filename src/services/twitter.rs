//! Twitter v1.1 timeline client.
//!
//! Reads `statuses/user_timeline` with an app-only bearer token.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, Post};
use crate::services::{TimelineClient, TimelineQuery};
use crate::utils::http::create_async_client;

/// Timeline endpoint, relative to the API base URL.
const TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";

/// HTTP implementation of [`TimelineClient`].
pub struct TwitterClient {
    client: Client,
    base_url: Url,
    bearer_token: String,
    page_size: u32,
}

impl TwitterClient {
    /// Create a client from the `[api]` configuration section.
    pub fn new(config: &ApiConfig, bearer_token: impl Into<String>) -> Result<Self> {
        let client = create_async_client(config)?;
        Self::with_client(client, config, bearer_token)
    }

    /// Create a client reusing an existing HTTP client.
    pub fn with_client(
        client: Client,
        config: &ApiConfig,
        bearer_token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            bearer_token: bearer_token.into(),
            page_size: config.page_size,
        })
    }

    /// Full request URL for a page query.
    pub fn timeline_url(&self, query: &TimelineQuery) -> Result<Url> {
        let mut url = self.base_url.join(TIMELINE_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("screen_name", &query.screen_name);
            if let Some(max_id) = query.max_id {
                pairs.append_pair("max_id", &max_id.to_string());
            }
            pairs.append_pair("count", &self.page_size.to_string());
            pairs.append_pair("exclude_replies", bool_param(query.exclude_replies));
            pairs.append_pair("include_rts", bool_param(query.include_rts));
            if query.extended {
                pairs.append_pair("tweet_mode", "extended");
            }
        }
        Ok(url)
    }
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[async_trait]
impl TimelineClient for TwitterClient {
    async fn user_timeline(&self, query: &TimelineQuery) -> Result<Vec<Post>> {
        let url = self.timeline_url(query)?;
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::api(status.as_u16(), body.trim()));
        }

        Ok(response.json::<Vec<Post>>().await?)
    }
}
