pub mod error;
pub mod types;

pub use error::{Result, ScrapeCreatorsError};
pub use types::{
    Item, Metrics, PageResponse, PageResult, Platform, RawItem, Source, DEFAULT_SCRAPER,
    DEFAULT_SOURCE_LIMIT, MAX_SOURCE_LIMIT,
};

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.scrapecreators.com";

pub const DEFAULT_USER_AGENT: &str = concat!("corpus-miner/", env!("CARGO_PKG_VERSION"));

/// Per-request ceiling. A page fetch that takes longer fails as a timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the mining API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct ScrapeCreatorsClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ScrapeCreatorsClient {
    /// Build a client. Fails if the API key is blank or the HTTP client can't be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ScrapeCreatorsError::Config(
                "ScrapeCreators API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ScrapeCreatorsError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch one page of mined items for a source. `limit` is sent as the
    /// upstream page-size hint (callers pass the source's effective limit);
    /// the upstream may return fewer or more, so callers enforce their own cap.
    pub async fn fetch_page(
        &self,
        source: &Source,
        cursor: Option<&str>,
        limit: u32,
        request_id: &str,
    ) -> Result<PageResult> {
        let url = format!("{}/v1/mine", self.config.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("platform", source.platform.to_string()),
            ("handle", source.handle.clone()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        tracing::debug!(
            platform = %source.platform,
            handle = %source.handle,
            cursor = cursor.unwrap_or(""),
            request_id,
            "Fetching mining page"
        );

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header("x-request-id", request_id)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScrapeCreatorsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let page: PageResponse = serde_json::from_str(&body)?;
        Ok(PageResult::from_response(page, source))
    }
}
