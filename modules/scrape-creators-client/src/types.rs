use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Items requested per source when the caller doesn't say.
pub const DEFAULT_SOURCE_LIMIT: u32 = 50;

/// Hard ceiling on items requested per source.
pub const MAX_SOURCE_LIMIT: u32 = 1000;

/// Scraper name stamped on items the upstream didn't attribute.
pub const DEFAULT_SCRAPER: &str = "scrapecreators";

// --- Request types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::Youtube),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// One mining request: a platform account (handle or profile URL) and how
/// many items to collect from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub platform: Platform,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Source {
    pub fn new(platform: Platform, handle: impl Into<String>) -> Self {
        Self {
            platform,
            handle: handle.into(),
            limit: None,
            notes: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Limit actually enforced: unset or zero falls back to the default,
    /// anything above the ceiling is clamped.
    pub fn effective_limit(&self) -> u32 {
        match self.limit {
            None | Some(0) => DEFAULT_SOURCE_LIMIT,
            Some(n) => n.min(MAX_SOURCE_LIMIT),
        }
    }
}

// --- Response types ---

/// Engagement counters. Platforms report different subsets. Counts that are
/// not whole numbers decode as `None` rather than failing the row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
}

/// A row as the upstream returns it. Every field is optional; the API has
/// shipped both snake_case and camelCase spellings. Typed fields that fail to
/// decode become `None` so one odd row never sinks the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient")]
    pub platform: Option<Platform>,
    #[serde(alias = "authorUsername")]
    pub author: Option<String>,
    #[serde(alias = "webVideoUrl", alias = "postUrl")]
    pub url: Option<String>,
    #[serde(alias = "captionOrTranscript")]
    pub caption_or_transcript: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metrics: Option<Metrics>,
    #[serde(alias = "detectedFormat")]
    pub detected_format: Option<String>,
    pub scraper: Option<String>,
    #[serde(default, alias = "scrapeMeta", deserialize_with = "lenient")]
    pub scrape_meta: Option<Map<String, Value>>,
    #[serde(alias = "platformPostId")]
    pub platform_post_id: Option<String>,
    #[serde(
        default,
        alias = "postedAt",
        alias = "createTimeISO",
        deserialize_with = "lenient"
    )]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Decode any JSON value, keeping it only if it parses as `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Counts arrive as integers, whole floats (`1.5e6`) or numeric strings.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_f64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn whole_f64(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly below 2^63.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then(|| f as i64)
}

impl RawItem {
    /// Normalize into an `Item`, filling gaps from the source it was mined for.
    pub fn into_item(self, source: &Source) -> Item {
        Item {
            platform: self.platform.unwrap_or(source.platform),
            author: self.author.unwrap_or_else(|| source.handle.clone()),
            url: self.url.unwrap_or_default(),
            caption_or_transcript: self.caption_or_transcript,
            metrics: self.metrics,
            detected_format: self.detected_format,
            scraper: self.scraper.unwrap_or_else(|| DEFAULT_SCRAPER.to_string()),
            scrape_meta: self.scrape_meta.unwrap_or_default(),
            platform_post_id: self.platform_post_id,
            posted_at: self.posted_at,
        }
    }
}

/// A mined content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub platform: Platform,
    pub author: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_or_transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_format: Option<String>,
    pub scraper: String,
    #[serde(default)]
    pub scrape_meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Stable identity used for dedup: the trimmed platform post id, else the
    /// trimmed URL. `None` when neither is usable.
    pub fn dedup_key(&self) -> Option<&str> {
        let post_id = self
            .platform_post_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        post_id.or_else(|| Some(self.url.trim()).filter(|url| !url.is_empty()))
    }
}

/// Wire shape of `GET /v1/mine`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default, alias = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// One page of normalized items plus the cursor for the next page, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub items: Vec<Item>,
    pub next_cursor: Option<String>,
}

impl PageResult {
    pub fn from_response(resp: PageResponse, source: &Source) -> Self {
        Self {
            items: resp
                .items
                .into_iter()
                .map(|raw| raw.into_item(source))
                .collect(),
            next_cursor: resp.next_cursor.filter(|c| !c.trim().is_empty()),
        }
    }
}
