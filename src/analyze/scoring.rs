//! Post scoring.
//!
//! score = max(0, recency_budget_hours - age_hours)
//!       + keyword_bonus  * (distinct vocabulary keywords found, case-insensitive substring)
//!       + cashtag_bonus  * (cashtag occurrences, e.g. `$WIF`)
//!       + tier_bonus     (if the account is in the privileged tier)
//!
//! Recency floors at zero: anything older than the budget competes on topic alone.
//! The result depends only on the post, the account and `now`.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::config::ScoringCfg;
use crate::ingest::types::Post;
use crate::registry::Account;

fn re_cashtag() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\$([A-Z][A-Z0-9]{1,9})\b").unwrap())
}

/// Cashtag symbols (without `$`) in order of appearance, duplicates kept.
pub fn extract_cashtags(text: &str) -> Vec<String> {
    re_cashtag()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Per-term contributions, for debug output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub recency: f64,
    pub keywords: Vec<String>,
    pub keyword_points: f64,
    pub cashtags: Vec<String>,
    pub cashtag_points: f64,
    pub tier_points: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.recency + self.keyword_points + self.cashtag_points + self.tier_points
    }
}

/// Only `Account::tier` reaches the score. `Account::weight` rides along from the
/// tier table for display and is deliberately ignored here.
#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: Vec<String>,
    keyword_bonus: f64,
    cashtag_bonus: f64,
    tier_bonus: f64,
    privileged_tier: u8,
    recency_budget_hours: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&ScoringCfg::default())
    }
}

impl Scorer {
    pub fn new(cfg: &ScoringCfg) -> Self {
        let mut keywords: Vec<String> = Vec::with_capacity(cfg.keywords.len());
        for k in &cfg.keywords {
            let k = k.trim().to_lowercase();
            if !k.is_empty() && !keywords.contains(&k) {
                keywords.push(k);
            }
        }
        Self {
            keywords,
            keyword_bonus: cfg.keyword_bonus,
            cashtag_bonus: cfg.cashtag_bonus,
            tier_bonus: cfg.tier_bonus,
            privileged_tier: cfg.privileged_tier,
            recency_budget_hours: cfg.recency_budget_hours,
        }
    }

    /// Hours between publication and `now`, never negative.
    pub fn age_hours(post: &Post, now: DateTime<Utc>) -> f64 {
        let ms = now
            .signed_duration_since(post.published_at)
            .num_milliseconds()
            .max(0);
        ms as f64 / 3_600_000.0
    }

    pub fn explain(&self, post: &Post, account: &Account, now: DateTime<Utc>) -> ScoreBreakdown {
        let recency = (self.recency_budget_hours - Self::age_hours(post, now)).max(0.0);

        let lowered = post.text.to_lowercase();
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect();
        let keyword_points = keywords.len() as f64 * self.keyword_bonus;

        let cashtags = extract_cashtags(&post.text);
        let cashtag_points = cashtags.len() as f64 * self.cashtag_bonus;

        let tier_points = if account.tier == Some(self.privileged_tier) {
            self.tier_bonus
        } else {
            0.0
        };

        ScoreBreakdown {
            recency,
            keywords,
            keyword_points,
            cashtags,
            cashtag_points,
            tier_points,
        }
    }

    pub fn score(&self, post: &Post, account: &Account, now: DateTime<Utc>) -> f64 {
        self.explain(post, account, now).total()
    }
}
