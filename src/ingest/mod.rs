// src/ingest/mod.rs
pub mod config;
pub mod fetch;
pub mod filter;
pub mod mirrors;
pub mod parse;
pub mod types;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::path::PathBuf;

use crate::analyze::{select, Scorer};
use crate::ingest::config::PipelineConfig;
use crate::ingest::mirrors::fetch_account_feed;
use crate::ingest::types::{FeedSource, Mirror, ScoredPost};
use crate::registry::SourceRegistry;
use crate::snapshot::write_snapshot;

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ct_feed_mirror_failures_total",
            "Failed (account, mirror) fetch attempts."
        );
        describe_counter!(
            "ct_feed_accounts_exhausted_total",
            "Accounts for which every mirror failed."
        );
        describe_counter!("ct_feed_posts_parsed_total", "Valid original posts parsed.");
        describe_counter!(
            "ct_feed_posts_dropped_total",
            "Items dropped as invalid, reshared or future-dated."
        );
        describe_counter!("ct_feed_snapshot_writes_total", "Snapshots written.");
        describe_counter!(
            "ct_feed_snapshot_preserved_total",
            "Runs that left the previous snapshot untouched."
        );
        describe_histogram!("ct_feed_fetch_ms", "Per-mirror fetch time in milliseconds.");
        describe_gauge!("ct_feed_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Short anonymized id for log lines; raw post text is never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A fresh snapshot replaced the file at `path`.
    Written { path: PathBuf, entries: usize },
    /// Every account failed on every mirror; the file was not touched.
    Preserved { accounts: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub accounts_ok: usize,
    pub accounts_exhausted: usize,
    pub candidates: usize,
    pub future_dropped: usize,
}

/// Run one batch pass: fetch every account (bounded concurrency, per-mirror fallback),
/// parse + filter + score, keep the top `cfg.limit`, and write the snapshot.
///
/// `now` is both the scoring clock and the snapshot's `fetchedAt`.
/// Only a snapshot write failure is returned as an error.
pub async fn run_once<S>(
    source: &S,
    registry: &SourceRegistry,
    cfg: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<RunReport>
where
    S: FeedSource + ?Sized,
{
    ensure_metrics_described();

    let mirrors: Vec<Mirror> = cfg.fetch.mirrors.iter().map(Mirror::new).collect();
    let timeout = cfg.fetch.timeout();
    let scorer = Scorer::new(&cfg.scoring);

    let mirrors_ref = &mirrors;
    let mut fetched: Vec<_> = stream::iter(registry.accounts().iter().enumerate())
        .map(|(i, account)| async move {
            (
                i,
                account,
                fetch_account_feed(source, account, mirrors_ref, timeout).await,
            )
        })
        .buffer_unordered(cfg.fetch.concurrency.max(1))
        .collect()
        .await;
    // Completion order is arbitrary; pool in registry order so ties stay deterministic.
    fetched.sort_by_key(|(i, _, _)| *i);

    let mut accounts_ok = 0usize;
    let mut accounts_exhausted = 0usize;
    let mut future_dropped = 0usize;
    let mut pool: Vec<ScoredPost> = Vec::new();

    for (_, account, result) in fetched {
        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    account = %account.identifier,
                    error = %e,
                    "account exhausted; contributing no posts"
                );
                counter!("ct_feed_accounts_exhausted_total").increment(1);
                accounts_exhausted += 1;
                continue;
            }
        };
        accounts_ok += 1;

        let before = pool.len();
        for post in parse::parse(&doc.body, &account.identifier, &cfg.parse.canonical_host) {
            if post.published_at > now {
                tracing::debug!(target: "ingest", account = %account.identifier, id = %anon_hash(&post.text), "future-dated post dropped");
                counter!("ct_feed_posts_dropped_total").increment(1);
                future_dropped += 1;
                continue;
            }
            let score = scorer.score(&post, account, now);
            pool.push(ScoredPost { post, score });
        }
        tracing::debug!(
            target: "ingest",
            account = %account.identifier,
            mirror = %doc.mirror.host,
            candidates = pool.len() - before,
            "account parsed"
        );
    }

    gauge!("ct_feed_last_run_ts").set(now.timestamp() as f64);
    let candidates = pool.len();

    if accounts_ok == 0 {
        tracing::error!(
            target: "ingest",
            accounts = registry.len(),
            mirrors = mirrors.len(),
            "every mirror failed for every account; preserving existing snapshot"
        );
        counter!("ct_feed_snapshot_preserved_total").increment(1);
        return Ok(RunReport {
            outcome: RunOutcome::Preserved {
                accounts: registry.len(),
            },
            accounts_ok,
            accounts_exhausted,
            candidates,
            future_dropped,
        });
    }

    let selection = select(pool, cfg.limit);
    for post in &selection {
        if let Some(account) = registry.find(&post.author) {
            let b = scorer.explain(post, account, now);
            tracing::debug!(
                target: "ingest",
                account = %post.author,
                id = %anon_hash(&post.text),
                score = b.total(),
                recency = b.recency,
                keywords = ?b.keywords,
                cashtags = ?b.cashtags,
                tier = b.tier_points,
                "selected"
            );
        }
    }

    let entries = write_snapshot(&selection, now, &cfg.output_path).await?;
    tracing::info!(
        target: "ingest",
        accounts_ok,
        accounts_exhausted,
        candidates,
        entries,
        "run complete"
    );

    Ok(RunReport {
        outcome: RunOutcome::Written {
            path: cfg.output_path.clone(),
            entries,
        },
        accounts_ok,
        accounts_exhausted,
        candidates,
        future_dropped,
    })
}
