use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeCreatorsError>;

#[derive(Debug, Error)]
pub enum ScrapeCreatorsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ScrapeCreatorsError {
    /// HTTP status for upstream rejections, `None` for transport and decode failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrapeCreatorsError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ScrapeCreatorsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeCreatorsError::Timeout(err.to_string())
        } else if err.is_decode() {
            ScrapeCreatorsError::Parse(err.to_string())
        } else {
            ScrapeCreatorsError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScrapeCreatorsError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeCreatorsError::Parse(err.to_string())
    }
}
