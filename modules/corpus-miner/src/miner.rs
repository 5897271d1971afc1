use std::collections::HashSet;
use std::sync::Arc;

use scrape_creators_client::{ClientConfig, Item, ScrapeCreatorsClient, Source};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::backoff::{failure_backoff, jitter};
use crate::classify::ErrorCategory;
use crate::config::MinerConfig;
use crate::error::Result;
use crate::stub::StubFetcher;
use crate::traits::{IdGenerator, PageFetcher, RandomIdGenerator, ScrapeCreatorsFetcher};

/// One failed page fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningError {
    pub source: Source,
    pub category: ErrorCategory,
    pub message: String,
    pub page: u32,
}

/// Aggregate output of one `mine` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineResult {
    pub items: Vec<Item>,
    pub errors: Vec<MiningError>,
    pub latency_ms: u64,
    pub request_id: String,
}

/// How paging ended for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Upstream returned no further cursor.
    Exhausted,
    /// The source's item limit was reached.
    LimitReached,
    /// The per-source page cap was hit.
    PageCapReached,
    /// A fetch failed with nothing to resume from, or the retry budget ran out.
    Abandoned,
}

/// Accumulators shared across the sources of a single run.
#[derive(Default)]
struct RunState {
    seen: HashSet<String>,
    items: Vec<Item>,
    errors: Vec<MiningError>,
}

pub struct Miner {
    fetcher: Arc<dyn PageFetcher>,
    ids: Arc<dyn IdGenerator>,
    config: MinerConfig,
}

impl Miner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: MinerConfig) -> Self {
        Self {
            fetcher,
            ids: Arc::new(RandomIdGenerator),
            config,
        }
    }

    /// Miner over the live API. Fails if the client config has no usable key.
    pub fn from_client_config(client: ClientConfig, config: MinerConfig) -> Result<Self> {
        let client = ScrapeCreatorsClient::new(client)?;
        info!(base_url = client.base_url(), "Using ScrapeCreators fetcher");
        Ok(Self::new(Arc::new(ScrapeCreatorsFetcher::new(client)), config))
    }

    /// Miner over synthetic data, for demos and offline runs.
    pub fn stub(config: MinerConfig) -> Self {
        Self::new(Arc::new(StubFetcher::new()), config)
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine every source in order and return the deduplicated corpus.
    /// Page failures are recorded in `errors`; this never fails outright.
    pub async fn mine(&self, sources: &[Source]) -> MineResult {
        let start = Instant::now();
        let request_id = self
            .config
            .request_id
            .clone()
            .unwrap_or_else(|| self.ids.next());

        info!(
            request_id = %request_id,
            sources = sources.len(),
            fetcher = self.fetcher.name(),
            "Mining run started"
        );

        let mut run = RunState::default();
        for source in sources {
            let before = run.items.len();
            let outcome = self.mine_source(source, &request_id, &mut run).await;
            info!(
                request_id = %request_id,
                platform = %source.platform,
                handle = %source.handle,
                items = run.items.len() - before,
                outcome = ?outcome,
                "Source finished"
            );
        }

        let latency_ms = elapsed_ms(start);
        info!(
            request_id = %request_id,
            items = run.items.len(),
            errors = run.errors.len(),
            latency_ms,
            "Mining run complete"
        );

        MineResult {
            items: run.items,
            errors: run.errors,
            latency_ms,
            request_id,
        }
    }

    async fn mine_source(
        &self,
        source: &Source,
        request_id: &str,
        run: &mut RunState,
    ) -> SourceOutcome {
        let max = source.effective_limit() as usize;
        let mut cursor: Option<String> = None;
        let mut collected = 0usize;
        let mut page = 0u32;
        let mut consecutive_failures = 0u32;

        while collected < max && page < self.config.max_pages_per_source {
            page += 1;
            let page_start = Instant::now();

            match self
                .fetcher
                .fetch_page(source, cursor.as_deref(), request_id)
                .await
            {
                Ok(result) => {
                    consecutive_failures = 0;
                    let latency_ms = elapsed_ms(page_start);
                    let returned = result.items.len();

                    for mut item in result.items {
                        if collected >= max {
                            break;
                        }
                        let Some(key) = item.dedup_key().map(str::to_owned) else {
                            continue;
                        };
                        if !run.seen.insert(key) {
                            continue;
                        }
                        stamp_scrape_meta(&mut item, request_id, latency_ms, page);
                        run.items.push(item);
                        collected += 1;
                    }

                    debug!(
                        handle = %source.handle,
                        page,
                        returned,
                        collected,
                        latency_ms,
                        "Page mined"
                    );

                    match result.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => return SourceOutcome::Exhausted,
                    }
                    if collected >= max {
                        return SourceOutcome::LimitReached;
                    }
                    sleep(jitter(self.config.per_source_rate_limit)).await;
                }
                Err(err) => {
                    consecutive_failures += 1;
                    let category = err.category();
                    warn!(
                        request_id,
                        platform = %source.platform,
                        handle = %source.handle,
                        page,
                        category = %category,
                        error = %err,
                        "Page fetch failed"
                    );
                    run.errors.push(MiningError {
                        source: source.clone(),
                        category,
                        message: err.message,
                        page,
                    });

                    sleep(jitter(failure_backoff(page))).await;

                    if cursor.is_none() {
                        return SourceOutcome::Abandoned;
                    }
                    if self
                        .config
                        .max_retries
                        .is_some_and(|budget| consecutive_failures > budget)
                    {
                        warn!(
                            handle = %source.handle,
                            failures = consecutive_failures,
                            "Retry budget exhausted, abandoning source"
                        );
                        return SourceOutcome::Abandoned;
                    }
                }
            }
        }

        if collected >= max {
            SourceOutcome::LimitReached
        } else {
            SourceOutcome::PageCapReached
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Add run correlation fields to `scrape_meta`. Keys the upstream already set win.
fn stamp_scrape_meta(item: &mut Item, request_id: &str, latency_ms: u64, page: u32) {
    let meta = &mut item.scrape_meta;
    meta.entry("request_id").or_insert_with(|| json!(request_id));
    meta.entry("latency_ms").or_insert_with(|| json!(latency_ms));
    meta.entry("page").or_insert_with(|| json!(page));
}
