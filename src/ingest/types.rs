// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::registry::Account;

/// One interchangeable endpoint able to serve any account's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    pub host: String,
}

impl Mirror {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// `{scheme}://{host}/{account}/rss`
    pub fn feed_url(&self, scheme: &str, account: &str) -> String {
        format!(
            "{}://{}/{}/rss",
            scheme,
            self.host.trim_end_matches('/'),
            account
        )
    }
}

/// Feed body as returned by one (account, mirror) attempt.
#[derive(Debug, Clone)]
pub struct RawFeedDocument {
    pub mirror: Mirror,
    pub body: String,
}

/// A candidate post parsed from a feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub author: String,
    pub text: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post: Post,
    pub score: f64,
}

/// Why a single mirror attempt (or a whole account) failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("http status {0}")]
    Status(u16),
    #[error("no mirrors configured")]
    NoMirrors,
    #[error("all {attempts} mirrors failed; last error: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<FetchError>,
    },
}

/// Fetches one account's feed from one mirror.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, account: &Account, mirror: &Mirror)
        -> Result<RawFeedDocument, FetchError>;
    fn name(&self) -> &'static str;
}
