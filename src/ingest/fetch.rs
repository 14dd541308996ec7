// src/ingest/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use crate::ingest::config::FetchCfg;
use crate::ingest::types::{FeedSource, FetchError, Mirror, RawFeedDocument};
use crate::registry::Account;

/// Live HTTP source: `GET {scheme}://{mirror}/{account}/rss` with a fixed identity header.
pub struct HttpFeedSource {
    client: reqwest::Client,
    scheme: String,
    timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(cfg: &FetchCfg) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent).context("user_agent is not a valid header")?,
        );
        let timeout = cfg.timeout();
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            scheme: cfg.scheme.clone(),
            timeout,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(
        &self,
        account: &Account,
        mirror: &Mirror,
    ) -> Result<RawFeedDocument, FetchError> {
        let url = mirror.feed_url(&self.scheme, &account.identifier);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|e| self.classify(e))?;
        Ok(RawFeedDocument {
            mirror: mirror.clone(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_follows_path_convention() {
        let m = Mirror::new("nitter.poast.org/");
        assert_eq!(
            m.feed_url("https", "cobie"),
            "https://nitter.poast.org/cobie/rss"
        );
    }

    #[test]
    fn bad_user_agent_is_rejected() {
        let cfg = FetchCfg {
            user_agent: "bad\nagent".into(),
            ..FetchCfg::default()
        };
        assert!(HttpFeedSource::new(&cfg).is_err());
    }
}
