// Seams for the miner's collaborators.
//
// PageFetcher — one page of upstream results per call. Production wiring uses
//   ScrapeCreatorsFetcher; StubFetcher and the scripted fetcher in `testing`
//   stand in without network access.
// IdGenerator — correlation ids for runs that don't bring their own.

use async_trait::async_trait;
use rand::distr::{Alphanumeric, SampleString};
use scrape_creators_client::{PageResult, ScrapeCreatorsClient, Source};

use crate::classify::FetchError;

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page for `source`, resuming from `cursor` when given.
    async fn fetch_page(
        &self,
        source: &Source,
        cursor: Option<&str>,
        request_id: &str,
    ) -> Result<PageResult, FetchError>;

    fn name(&self) -> &str;
}

/// Live fetcher backed by the ScrapeCreators REST API.
pub struct ScrapeCreatorsFetcher {
    client: ScrapeCreatorsClient,
}

impl ScrapeCreatorsFetcher {
    pub fn new(client: ScrapeCreatorsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for ScrapeCreatorsFetcher {
    async fn fetch_page(
        &self,
        source: &Source,
        cursor: Option<&str>,
        request_id: &str,
    ) -> Result<PageResult, FetchError> {
        Ok(self
            .client
            .fetch_page(source, cursor, source.effective_limit(), request_id)
            .await?)
    }

    fn name(&self) -> &str {
        "scrapecreators"
    }
}

// ---------------------------------------------------------------------------
// IdGenerator
// ---------------------------------------------------------------------------

pub trait IdGenerator: Send + Sync {
    fn next(&self) -> String;
}

/// `mine-` followed by 8 random alphanumerics.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next(&self) -> String {
        format!("mine-{}", Alphanumeric.sample_string(&mut rand::rng(), 8))
    }
}

/// Always hands out the same id.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator(pub String);

impl IdGenerator for FixedIdGenerator {
    fn next(&self) -> String {
        self.0.clone()
    }
}
