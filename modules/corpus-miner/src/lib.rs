pub mod backoff;
pub mod classify;
pub mod config;
pub mod error;
pub mod miner;
pub mod stub;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use classify::{classify, classify_message, ErrorCategory, FetchError, FetchErrorKind};
pub use config::{MinerConfig, MinerSettings};
pub use error::{MinerError, Result};
pub use miner::{MineResult, Miner, MiningError, SourceOutcome};
pub use stub::StubFetcher;
pub use traits::{FixedIdGenerator, IdGenerator, PageFetcher, RandomIdGenerator, ScrapeCreatorsFetcher};

pub use scrape_creators_client::{Item, Metrics, PageResult, Platform, Source};
