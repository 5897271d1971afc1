use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use corpus_miner::{Miner, MinerSettings, Source, StubFetcher};

#[derive(Parser)]
#[command(name = "corpus-miner")]
#[command(about = "Mine a deduplicated corpus from social sources")]
#[command(version)]
struct Cli {
    /// JSON array of sources, or `-` to read from stdin
    sources: PathBuf,

    /// Serve synthetic pages instead of calling the API
    #[arg(long)]
    stub: bool,

    /// Artificial latency per stub page
    #[arg(long, default_value_t = 200)]
    stub_latency_ms: u64,

    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("corpus_miner=info".parse()?))
        .init();

    let cli = Cli::parse();
    let sources = read_sources(&cli.sources, std::io::stdin())?;
    info!(count = sources.len(), "Loaded sources");

    let settings = MinerSettings::from_env()?;
    let miner = if cli.stub {
        let stub = StubFetcher::new().with_latency(Duration::from_millis(cli.stub_latency_ms));
        Miner::new(Arc::new(stub), settings.miner.clone())
    } else {
        Miner::from_client_config(settings.require_client()?, settings.miner.clone())?
    };

    let result = miner.mine(&sources).await;

    let out = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{out}");
    Ok(())
}

/// Load sources from `path`, or from `stdin` when the path is `-`.
fn read_sources(path: &Path, mut stdin: impl Read) -> Result<Vec<Source>> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("Failed to read sources from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Sources must be a JSON array of {platform, handle, limit?, notes?}")
}
