use std::fmt;

use scrape_creators_client::ScrapeCreatorsError;
use serde::{Deserialize, Serialize};

/// Why a page fetch failed, as reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimit,
    Timeout,
    Network,
    ApiError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::ApiError => "api_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level shape of a failed fetch, tagged where the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Network,
    Http,
    Decode,
    Other,
}

/// A page fetch failure as seen by the miner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Http,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Other, message)
    }

    pub fn category(&self) -> ErrorCategory {
        classify(self)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchError {}

impl From<ScrapeCreatorsError> for FetchError {
    fn from(err: ScrapeCreatorsError) -> Self {
        let message = err.to_string();
        match err {
            ScrapeCreatorsError::Timeout(_) => FetchError::new(FetchErrorKind::Timeout, message),
            ScrapeCreatorsError::Network(_) => FetchError::new(FetchErrorKind::Network, message),
            ScrapeCreatorsError::Api { status, .. } => FetchError::http(status, message),
            ScrapeCreatorsError::Parse(_) => FetchError::new(FetchErrorKind::Decode, message),
            ScrapeCreatorsError::Config(_) => FetchError::other(message),
        }
    }
}

/// Map a tagged fetch failure to its category. HTTP 429 and the transport
/// tags decide first; everything else falls through to the message rules.
pub fn classify(err: &FetchError) -> ErrorCategory {
    if err.status == Some(429) {
        return ErrorCategory::RateLimit;
    }
    match err.kind {
        FetchErrorKind::Timeout => ErrorCategory::Timeout,
        FetchErrorKind::Network => ErrorCategory::Network,
        FetchErrorKind::Http | FetchErrorKind::Decode | FetchErrorKind::Other => {
            classify_message(&err.message)
        }
    }
}

/// Case-insensitive keyword classification of a free-text error message.
pub fn classify_message(message: &str) -> ErrorCategory {
    let msg = message.to_lowercase();
    if msg.contains("rate limit") || msg.contains("429") {
        ErrorCategory::RateLimit
    } else if msg.contains("timeout") {
        ErrorCategory::Timeout
    } else if msg.contains("network")
        || msg.contains("enotfound")
        || msg.contains("econn")
        || msg.contains("fetch failed")
    {
        ErrorCategory::Network
    } else {
        ErrorCategory::ApiError
    }
}
