//! Top-N selection across every account's candidates.

use crate::ingest::types::{Post, ScoredPost};

/// Highest scores first, scores stripped. The sort is stable, so equal scores keep
/// pool order (registry order, then feed order).
pub fn select(mut scored: Vec<ScoredPost>, limit: usize) -> Vec<Post> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored.into_iter().map(|s| s.post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sp(text: &str, score: f64) -> ScoredPost {
        ScoredPost {
            post: Post {
                author: "alice".into(),
                text: text.into(),
                url: "https://x.com/alice".into(),
                published_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            },
            score,
        }
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let out = select(vec![sp("a", 1.0), sp("b", 5.0), sp("c", 3.0), sp("d", -2.0)], 3);
        let texts: Vec<_> = out.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let out = select(vec![sp("first", 2.0), sp("second", 2.0), sp("third", 2.0)], 2);
        let texts: Vec<_> = out.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn limit_larger_than_pool() {
        assert_eq!(select(vec![sp("a", 1.0)], 10).len(), 1);
        assert!(select(vec![], 3).is_empty());
    }
}
