// src/ingest/mirrors.rs
//! Per-account mirror fallback.
//!
//! Each account walks the shared mirror list in order as a tiny state machine:
//! `Trying(i)` → `Succeeded(doc)` on the first good response, or `Exhausted`
//! once every mirror has failed. A failure only ever moves to the next mirror.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

use crate::ingest::types::{FeedSource, FetchError, Mirror, RawFeedDocument};
use crate::registry::Account;

#[derive(Debug)]
pub enum MirrorState {
    Trying(usize),
    Succeeded(RawFeedDocument),
    Exhausted,
}

/// Fetch `account`'s feed from the first mirror that answers.
///
/// Every attempt is capped by `attempt_timeout` on top of whatever the source does
/// itself, so a hung mirror costs at most that long. Failed attempts are logged here;
/// the returned `Exhausted` error carries the last one for the caller.
pub async fn fetch_account_feed<S>(
    source: &S,
    account: &Account,
    mirrors: &[Mirror],
    attempt_timeout: Duration,
) -> Result<RawFeedDocument, FetchError>
where
    S: FeedSource + ?Sized,
{
    if mirrors.is_empty() {
        return Err(FetchError::NoMirrors);
    }

    let mut last_err: Option<FetchError> = None;
    let mut state = MirrorState::Trying(0);

    loop {
        state = match state {
            MirrorState::Trying(i) if i >= mirrors.len() => MirrorState::Exhausted,
            MirrorState::Trying(i) => {
                let mirror = &mirrors[i];
                let t0 = Instant::now();
                let attempt =
                    match tokio::time::timeout(attempt_timeout, source.fetch(account, mirror)).await
                    {
                        Ok(r) => r,
                        Err(_) => Err(FetchError::Timeout(attempt_timeout)),
                    };
                histogram!("ct_feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

                match attempt {
                    Ok(doc) => MirrorState::Succeeded(doc),
                    Err(e) => {
                        tracing::warn!(
                            target: "ingest",
                            account = %account.identifier,
                            mirror = %mirror.host,
                            source = source.name(),
                            error = %e,
                            "mirror failed"
                        );
                        counter!("ct_feed_mirror_failures_total").increment(1);
                        last_err = Some(e);
                        MirrorState::Trying(i + 1)
                    }
                }
            }
            MirrorState::Succeeded(doc) => {
                tracing::debug!(
                    target: "ingest",
                    account = %account.identifier,
                    mirror = %doc.mirror.host,
                    bytes = doc.body.len(),
                    "feed fetched"
                );
                return Ok(doc);
            }
            MirrorState::Exhausted => {
                return Err(FetchError::Exhausted {
                    attempts: mirrors.len(),
                    last: Box::new(last_err.unwrap_or(FetchError::NoMirrors)),
                });
            }
        };
    }
}
