// Test doubles for the miner.
//
// - ScriptedFetcher (PageFetcher): per-handle queue of canned pages/errors
// - EndlessFetcher (PageFetcher): always has another page
//
// Plus builders for items and pages.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use scrape_creators_client::{Item, PageResult, Platform, RawItem, Source};

use crate::classify::FetchError;
use crate::traits::PageFetcher;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Item with an optional post id and a URL (either may be blank).
pub fn item(post_id: Option<&str>, url: &str) -> Item {
    RawItem {
        platform_post_id: post_id.map(String::from),
        url: Some(url.to_string()),
        ..Default::default()
    }
    .into_item(&Source::new(Platform::Tiktok, "@test"))
}

/// Item identified by `post_id`, with a URL derived from it.
pub fn post(post_id: &str) -> Item {
    item(Some(post_id), &format!("https://example.com/p/{post_id}"))
}

pub fn page(items: Vec<Item>, next_cursor: Option<&str>) -> PageResult {
    PageResult {
        items,
        next_cursor: next_cursor.map(String::from),
    }
}

pub fn source(platform: Platform, handle: &str, limit: u32) -> Source {
    Source::new(platform, handle).with_limit(limit)
}

// ---------------------------------------------------------------------------
// ScriptedFetcher
// ---------------------------------------------------------------------------

/// Replays scripted responses per source handle, in order. Once a handle's
/// script runs out it gets its fallback, or an `api_error` if none was set.
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<PageResult, FetchError>>>>,
    fallbacks: HashMap<String, FetchError>,
    calls: Mutex<Vec<(String, Option<String>, String)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallbacks: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(self, handle: &str, page: PageResult) -> Self {
        self.push(handle, Ok(page))
    }

    pub fn on_error(self, handle: &str, err: FetchError) -> Self {
        self.push(handle, Err(err))
    }

    /// Error returned for `handle` after its script is exhausted.
    pub fn fail_always(mut self, handle: &str, err: FetchError) -> Self {
        self.fallbacks.insert(handle.to_string(), err);
        self
    }

    fn push(self, handle: &str, response: Result<PageResult, FetchError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(handle.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// `(handle, cursor, request_id)` for every call, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, handle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _, _)| h == handle)
            .count()
    }
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(
        &self,
        source: &Source,
        cursor: Option<&str>,
        request_id: &str,
    ) -> Result<PageResult, FetchError> {
        self.calls.lock().unwrap().push((
            source.handle.clone(),
            cursor.map(String::from),
            request_id.to_string(),
        ));

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&source.handle)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(response) => response,
            None => Err(self
                .fallbacks
                .get(&source.handle)
                .cloned()
                .unwrap_or_else(|| FetchError::other(format!("no script for {}", source.handle)))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// EndlessFetcher
// ---------------------------------------------------------------------------

/// Returns one fresh item and a fresh cursor on every call.
#[derive(Default)]
pub struct EndlessFetcher {
    calls: AtomicU32,
}

impl EndlessFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for EndlessFetcher {
    async fn fetch_page(
        &self,
        source: &Source,
        _cursor: Option<&str>,
        _request_id: &str,
    ) -> Result<PageResult, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{}-{n}", source.handle);
        Ok(page(vec![post(&id)], Some(&format!("cursor-{n}"))))
    }

    fn name(&self) -> &str {
        "endless"
    }
}
