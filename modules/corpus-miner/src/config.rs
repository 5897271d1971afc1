use std::env;
use std::time::Duration;

use scrape_creators_client::ClientConfig;

use crate::error::{MinerError, Result};

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(600);
pub const DEFAULT_MAX_PAGES_PER_SOURCE: u32 = 50;

/// Paging behaviour for a `Miner`.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Correlation id for every run. When unset each run draws one from the
    /// miner's id generator.
    pub request_id: Option<String>,
    /// Minimum pause between two pages of the same source.
    pub per_source_rate_limit: Duration,
    /// Consecutive retries allowed per source after a failed fetch. `None`
    /// keeps retrying while a cursor exists, bounded only by the page cap.
    pub max_retries: Option<u32>,
    pub max_pages_per_source: u32,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            request_id: None,
            per_source_rate_limit: DEFAULT_RATE_LIMIT,
            max_retries: None,
            max_pages_per_source: DEFAULT_MAX_PAGES_PER_SOURCE,
        }
    }
}

impl MinerConfig {
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.per_source_rate_limit = rate_limit;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages_per_source = max_pages;
        self
    }
}

/// Everything the binary needs, loaded from the environment.
#[derive(Debug, Clone)]
pub struct MinerSettings {
    /// `None` when `SCRAPECREATORS_API_KEY` is unset; only stub runs accept that.
    pub client: Option<ClientConfig>,
    pub miner: MinerConfig,
}

impl MinerSettings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let client = optional_env("SCRAPECREATORS_API_KEY").map(|key| {
            let mut config = ClientConfig::new(key);
            if let Some(url) = optional_env("SCRAPECREATORS_BASE_URL") {
                config = config.with_base_url(&url);
            }
            if let Some(ua) = optional_env("MINER_USER_AGENT") {
                config = config.with_user_agent(&ua);
            }
            config
        });

        let mut miner = MinerConfig::default();
        if let Some(id) = optional_env("MINER_REQUEST_ID") {
            miner = miner.with_request_id(id);
        }
        if let Some(ms) = parse_env::<u64>("MINER_RATE_LIMIT_MS")? {
            miner = miner.with_rate_limit(Duration::from_millis(ms));
        }
        if let Some(n) = parse_env::<u32>("MINER_MAX_RETRIES")? {
            miner = miner.with_max_retries(n);
        }

        let settings = Self { client, miner };
        settings.log_redacted();
        Ok(settings)
    }

    /// Client config for a live run. A missing key is a configuration error.
    pub fn require_client(&self) -> Result<ClientConfig> {
        self.client
            .clone()
            .ok_or_else(|| MinerError::Config("SCRAPECREATORS_API_KEY is required".to_string()))
    }

    fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        match &self.client {
            Some(client) => {
                tracing::info!("  SCRAPECREATORS_API_KEY: {}", preview(&client.api_key));
                tracing::info!("  SCRAPECREATORS_BASE_URL: {}", client.base_url);
                tracing::info!("  MINER_USER_AGENT: {}", client.user_agent);
            }
            None => tracing::info!("  SCRAPECREATORS_API_KEY: <not set>"),
        }
        tracing::info!(
            "  MINER_REQUEST_ID: {}",
            self.miner.request_id.as_deref().unwrap_or("<generated>")
        );
        tracing::info!(
            "  MINER_RATE_LIMIT_MS: {}",
            self.miner.per_source_rate_limit.as_millis()
        );
        match self.miner.max_retries {
            Some(n) => tracing::info!("  MINER_MAX_RETRIES: {}", n),
            None => tracing::info!("  MINER_MAX_RETRIES: <unbounded>"),
        }
    }
}

/// First five characters of a secret plus its length, for logs.
fn preview(val: &str) -> String {
    let n: usize = val.chars().take(5).map(char::len_utf8).sum();
    format!("{}...({} chars)", &val[..n], val.chars().count())
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| MinerError::Config(format!("{key} must be a number, got {raw:?}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const ENV_KEYS: [&str; 6] = [
        "SCRAPECREATORS_API_KEY",
        "SCRAPECREATORS_BASE_URL",
        "MINER_USER_AGENT",
        "MINER_REQUEST_ID",
        "MINER_RATE_LIMIT_MS",
        "MINER_MAX_RETRIES",
    ];

    // Tests in this module share the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets variables for the life of the guard and clears every miner key on drop.
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
    }

    impl EnvGuard<'_> {
        fn set(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            for key in ENV_KEYS {
                env::remove_var(key);
            }
            for (key, val) in vars {
                env::set_var(key, val);
            }
            Self { _lock: lock }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for key in ENV_KEYS {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn from_env_maps_every_variable() {
        let _env = EnvGuard::set(&[
            ("SCRAPECREATORS_API_KEY", "sk-live-123456"),
            ("SCRAPECREATORS_BASE_URL", "http://localhost:9999/"),
            ("MINER_USER_AGENT", "corpus-test/1.0"),
            ("MINER_REQUEST_ID", "mine-fixed01"),
            ("MINER_RATE_LIMIT_MS", " 250 "),
            ("MINER_MAX_RETRIES", "4"),
        ]);

        let settings = MinerSettings::from_env().unwrap();

        let client = settings.client.expect("api key was set");
        assert_eq!(client.api_key, "sk-live-123456");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.user_agent, "corpus-test/1.0");
        assert_eq!(settings.miner.request_id.as_deref(), Some("mine-fixed01"));
        assert_eq!(settings.miner.per_source_rate_limit, Duration::from_millis(250));
        assert_eq!(settings.miner.max_retries, Some(4));
        assert_eq!(settings.miner.max_pages_per_source, DEFAULT_MAX_PAGES_PER_SOURCE);
    }

    #[test]
    fn from_env_without_variables_uses_defaults() {
        let _env = EnvGuard::set(&[("MINER_USER_AGENT", "ignored-without-key")]);

        let settings = MinerSettings::from_env().unwrap();

        assert!(settings.client.is_none());
        assert!(settings.miner.request_id.is_none());
        assert_eq!(settings.miner.per_source_rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(settings.miner.max_retries, None);
    }

    #[test]
    fn from_env_rejects_malformed_retry_budget() {
        let _env = EnvGuard::set(&[("MINER_MAX_RETRIES", "lots")]);
        assert!(matches!(MinerSettings::from_env(), Err(MinerError::Config(_))));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = MinerConfig::default();
        assert_eq!(config.per_source_rate_limit, Duration::from_millis(600));
        assert_eq!(config.max_retries, None);
        assert_eq!(config.max_pages_per_source, 50);
        assert!(config.request_id.is_none());
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("sk-live-123"), "sk-li...(11 chars)");
        assert_eq!(preview("clé-ünïcødé"), "clé-ü...(11 chars)");
    }

    #[test]
    fn missing_key_is_config_error() {
        let settings = MinerSettings {
            client: None,
            miner: MinerConfig::default(),
        };
        assert!(matches!(settings.require_client(), Err(MinerError::Config(_))));
    }

    #[test]
    fn malformed_number_is_config_error() {
        let _env = EnvGuard::set(&[]);
        env::set_var("MINER_TEST_BAD_NUMBER", "six hundred");
        let parsed = parse_env::<u64>("MINER_TEST_BAD_NUMBER");
        env::remove_var("MINER_TEST_BAD_NUMBER");
        assert!(matches!(parsed, Err(MinerError::Config(_))));
    }

    #[test]
    fn unset_number_is_none() {
        assert!(parse_env::<u32>("MINER_TEST_UNSET_NUMBER").unwrap().is_none());
    }
}
