use std::time::Duration;

use async_trait::async_trait;
use scrape_creators_client::{Item, Metrics, PageResult, Source};
use serde_json::{json, Map};

use crate::classify::FetchError;
use crate::traits::PageFetcher;

/// Items synthesized per stub page.
pub const STUB_ITEMS_PER_PAGE: usize = 5;

const STUB_CURSOR: &str = "stub-page-2";
const STUB_LATENCY: Duration = Duration::from_millis(200);

/// Offline fetcher that serves two deterministic pages per source: the
/// cursor-less call returns a cursor, any call with a cursor ends paging.
pub struct StubFetcher {
    latency: Duration,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            latency: STUB_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn sample_item(source: &Source, page: u32, index: usize) -> Item {
        let handle = source.handle.trim_start_matches('@');
        let post_id = format!("stub-{}-{}-{}-{}", source.platform, handle, page, index);
        let mut scrape_meta = Map::new();
        scrape_meta.insert("stub".to_string(), json!(true));

        Item {
            platform: source.platform,
            author: source.handle.clone(),
            url: format!("https://{}.example/{}/{}", source.platform, handle, post_id),
            caption_or_transcript: Some(format!(
                "Sample {} post {} from {} (page {})",
                source.platform, index, source.handle, page
            )),
            metrics: Some(Metrics {
                views: Some(1000 * (index as i64 + 1)),
                likes: Some(100 * (index as i64 + 1)),
                comments: Some(10 * (index as i64 + 1)),
            }),
            detected_format: Some("short_video".to_string()),
            scraper: "stub".to_string(),
            scrape_meta,
            platform_post_id: Some(post_id),
            posted_at: None,
        }
    }
}

impl Default for StubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_page(
        &self,
        source: &Source,
        cursor: Option<&str>,
        _request_id: &str,
    ) -> Result<PageResult, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let page = if cursor.is_some() { 2 } else { 1 };
        let items = (0..STUB_ITEMS_PER_PAGE)
            .map(|i| Self::sample_item(source, page, i))
            .collect();

        Ok(PageResult {
            items,
            next_cursor: cursor.is_none().then(|| STUB_CURSOR.to_string()),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrape_creators_client::Platform;

    #[tokio::test]
    async fn two_pages_then_done() {
        let stub = StubFetcher::new().with_latency(Duration::ZERO);
        let source = Source::new(Platform::Tiktok, "@a");

        let first = stub.fetch_page(&source, None, "r").await.unwrap();
        assert_eq!(first.items.len(), STUB_ITEMS_PER_PAGE);
        let cursor = first.next_cursor.expect("first page has a cursor");

        let second = stub.fetch_page(&source, Some(&cursor), "r").await.unwrap();
        assert_eq!(second.items.len(), STUB_ITEMS_PER_PAGE);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn items_are_deterministic_and_distinct_across_pages() {
        let stub = StubFetcher::new().with_latency(Duration::ZERO);
        let source = Source::new(Platform::Youtube, "@b");

        let a = stub.fetch_page(&source, None, "r").await.unwrap();
        let b = stub.fetch_page(&source, None, "r").await.unwrap();
        assert_eq!(a, b);

        let second = stub.fetch_page(&source, Some(STUB_CURSOR), "r").await.unwrap();
        assert_ne!(a.items[0].dedup_key(), second.items[0].dedup_key());
    }
}
