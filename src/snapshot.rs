//! Snapshot artifact: the ranked top-N list the site renders.
//!
//! JSON shape (array, pretty-printed):
//! [
//!   { "author": "cobie", "text": "...", "url": "https://x.com/cobie/status/1",
//!     "publishedAt": "2026-03-01T10:00:00.000Z", "fetchedAt": "2026-03-01T12:00:00.000Z" }
//! ]
//!
//! Writes go to `<path>.tmp` and are renamed over the target, so readers see either
//! the previous file or the new one.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ingest::types::Post;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub author: String,
    pub text: String,
    pub url: String,
    pub published_at: String,
    pub fetched_at: String,
}

/// ISO-8601 UTC with milliseconds and a `Z` suffix.
pub fn iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Attach one `fetchedAt` to every selected post.
/// Entries with empty text or a publish time after `fetched_at` are left out.
pub fn build_snapshot(selection: &[Post], fetched_at: DateTime<Utc>) -> Vec<SnapshotEntry> {
    let fetched = iso8601(fetched_at);
    selection
        .iter()
        .filter(|p| !p.text.trim().is_empty() && p.published_at <= fetched_at)
        .map(|p| SnapshotEntry {
            author: p.author.clone(),
            text: p.text.clone(),
            url: p.url.clone(),
            published_at: iso8601(p.published_at),
            fetched_at: fetched.clone(),
        })
        .collect()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` next to `path` and rename into place, creating parent dirs.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()));
    }
    Ok(())
}

/// Serialize and persist the selection. Returns the number of entries written.
pub async fn write_snapshot(
    selection: &[Post],
    fetched_at: DateTime<Utc>,
    path: &Path,
) -> Result<usize> {
    let entries = build_snapshot(selection, fetched_at);
    let json = serde_json::to_vec_pretty(&entries).context("serializing snapshot")?;
    write_atomic(path, &json).await?;
    counter!("ct_feed_snapshot_writes_total").increment(1);
    tracing::info!(
        target: "snapshot",
        path = %path.display(),
        entries = entries.len(),
        "snapshot written"
    );
    Ok(entries.len())
}

pub async fn read_snapshot(path: &Path) -> Result<Vec<SnapshotEntry>> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}
