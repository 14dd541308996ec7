// src/ingest/filter.rs
//! Reshare filter. A literal prefix test, nothing smarter: a quote-tweet with
//! commentary in front of the marker is kept.

/// Retweet marker as Nitter renders it in item titles.
pub const RESHARE_MARKER: &str = "RT @";

/// `false` for retweets and bare `@` replies, `true` for everything else.
pub fn is_original(text: &str) -> bool {
    let t = text.trim_start();
    !(t.starts_with(RESHARE_MARKER) || t.starts_with('@'))
}
