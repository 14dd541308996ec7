//! ct-feed — Batch Entrypoint
//! One pass: poll every account through the mirror list, rank, write the snapshot.
//! Meant to be run by cron; exits 0 whether the snapshot was refreshed or preserved.

use ct_feed::telemetry::{flush_after, Metrics};
use ct_feed::{load_config_default, run_from_config, RunOutcome};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact human logs by default; JSON lines when CT_FEED_LOG_FORMAT=json.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ct_feed=info,warn"));

    let json = std::env::var("CT_FEED_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics recorder unavailable");
            None
        }
    };

    let result = run_from_config(&cfg).await;
    let report = flush_after(metrics.as_ref(), cfg.metrics_path.as_deref(), result).await?;
    match &report.outcome {
        RunOutcome::Written { path, entries } => {
            tracing::info!(path = %path.display(), entries, "snapshot refreshed");
        }
        RunOutcome::Preserved { accounts } => {
            tracing::warn!(accounts, "snapshot preserved; no account could be fetched");
        }
    }

    Ok(())
}
