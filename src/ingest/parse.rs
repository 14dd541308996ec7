// src/ingest/parse.rs
//! Tolerant scanner for Nitter RSS.
//!
//! Mirrors do not reliably emit well-formed XML, so instead of a real parser we cut
//! the body on `<item>…</item>` and pull `title`, `link` and `pubDate` out of each
//! block with patterns. A broken item is dropped; its siblings are not affected.

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;

use crate::ingest::filter::is_original;
use crate::ingest::types::Post;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item has no text")]
    MissingText,
    #[error("item has no publish date")]
    MissingDate,
    #[error("unparseable publish date: {0}")]
    InvalidDate(String),
    #[error("item is a reshare")]
    Reshare,
}

fn re_item() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").unwrap())
}

fn re_title() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").unwrap())
}

fn re_link() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<link\b[^>]*>(.*?)</link>").unwrap())
}

fn re_pub_date() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<pubDate\b[^>]*>(.*?)</pubDate>").unwrap())
}

/// Strip CDATA wrappers, decode entities (named and numeric), trim.
pub fn decode_field(raw: &str) -> String {
    let unwrapped = raw.replace("<![CDATA[", "").replace("]]>", "");
    html_escape::decode_html_entities(&unwrapped).trim().to_string()
}

fn extract_tag(re: &Regex, block: &str) -> String {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| decode_field(m.as_str()))
        .unwrap_or_default()
}

/// RFC 2822 (what RSS uses), then RFC 2822 with the weekday ignored, then RFC 3339.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc2822(s)
        .ok()
        .or_else(|| parse_rfc2822_loose(s))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Mirrors sometimes emit a weekday that doesn't match the date. The weekday is
/// redundant, so drop it and read `01 Mar 2026 10:00:00 GMT` as-is.
fn parse_rfc2822_loose(s: &str) -> Option<DateTime<FixedOffset>> {
    let (_, rest) = s.split_once(',')?;
    let rest = rest.trim();
    let rest = match rest.rsplit_once(' ') {
        Some((head, "GMT" | "UT" | "UTC" | "Z")) => format!("{head} +0000"),
        _ => rest.to_string(),
    };
    DateTime::parse_from_str(&rest, "%d %b %Y %H:%M:%S %z").ok()
}

/// Re-host a mirror permalink on the canonical domain, keeping its path.
/// Anything that doesn't parse as an absolute URL becomes the author's profile.
pub fn canonical_url(link: &str, author: &str, canonical_host: &str) -> String {
    match reqwest::Url::parse(link.trim()) {
        Ok(u) if u.has_host() => format!("https://{}{}", canonical_host, u.path()),
        _ => format!("https://{}/{}", canonical_host, author),
    }
}

/// Scan `document` and yield one result per `<item>` block, in document order.
pub fn parse_items<'a>(
    document: &'a str,
    author: &'a str,
    canonical_host: &'a str,
) -> impl Iterator<Item = Result<Post, ItemError>> + 'a {
    re_item().captures_iter(document).map(move |caps| {
        let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        parse_block(block, author, canonical_host)
    })
}

fn parse_block(block: &str, author: &str, canonical_host: &str) -> Result<Post, ItemError> {
    let text = extract_tag(re_title(), block);
    if text.is_empty() {
        return Err(ItemError::MissingText);
    }
    let raw_date = extract_tag(re_pub_date(), block);
    if raw_date.is_empty() {
        return Err(ItemError::MissingDate);
    }
    if !is_original(&text) {
        return Err(ItemError::Reshare);
    }
    let published_at =
        parse_pub_date(&raw_date).ok_or_else(|| ItemError::InvalidDate(raw_date.clone()))?;
    let link = extract_tag(re_link(), block);

    Ok(Post {
        author: author.to_string(),
        url: canonical_url(&link, author, canonical_host),
        text,
        published_at,
    })
}

/// Valid, original posts only. Dropped items are counted and logged at debug.
pub fn parse<'a>(
    document: &'a str,
    author: &'a str,
    canonical_host: &'a str,
) -> impl Iterator<Item = Post> + 'a {
    parse_items(document, author, canonical_host).filter_map(move |r| match r {
        Ok(p) => {
            counter!("ct_feed_posts_parsed_total").increment(1);
            Some(p)
        }
        Err(e) => {
            tracing::debug!(target: "ingest", account = author, reason = %e, "item dropped");
            counter!("ct_feed_posts_dropped_total").increment(1);
            None
        }
    })
}
