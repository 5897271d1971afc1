use scrape_creators_client::ScrapeCreatorsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MinerError>;

/// Errors that escape the miner. Page-level failures never do; they are
/// recorded on the `MineResult` instead.
#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Client(#[from] ScrapeCreatorsError),
}
