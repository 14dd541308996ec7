// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod ingest;
pub mod registry;
pub mod snapshot;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::ingest::config::{load_config_default, load_config_from, PipelineConfig};
pub use crate::ingest::types::{FeedSource, FetchError, Mirror, Post, RawFeedDocument};
pub use crate::ingest::{run_once, RunOutcome, RunReport};
pub use crate::registry::{Account, SourceRegistry, TierTable};

use tracing::info;

/// Full production pass: real HTTP source, tier table from config, wall clock.
///
/// Returns `Ok` both when a snapshot was written and when the previous one was
/// preserved; only an unusable config or a failed write is an error.
pub async fn run_from_config(cfg: &PipelineConfig) -> anyhow::Result<RunReport> {
    let tiers = match &cfg.tiers_path {
        Some(p) => TierTable::load_from_file(p),
        None => TierTable::default(),
    };
    let registry = SourceRegistry::build(&cfg.accounts, &tiers);
    info!(
        accounts = registry.len(),
        mirrors = cfg.fetch.mirrors.len(),
        tiers = tiers.len(),
        limit = cfg.limit,
        "starting ct-feed run"
    );

    let source = ingest::fetch::HttpFeedSource::new(&cfg.fetch)?;
    run_once(&source, &registry, cfg, chrono::Utc::now()).await
}
