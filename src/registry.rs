//! # Source Registry
//!
//! The roster of tracked accounts plus the read-only account → tier table.
//!
//! - The tier table is loaded once per run from a JSON array shaped like the
//!   site's `kol-accounts.json` (`handle`, `tier`, `weight`, ...).
//! - Lookups are case-insensitive: keys are lower-cased handles.
//! - A missing or malformed table degrades to an empty one; scoring then simply
//!   never awards a tier bonus.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// A tracked identity whose public feed is polled.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub identifier: String,
    pub tier: Option<u8>,
    /// Informational only; the scorer reads `tier`.
    pub weight: Option<f64>,
}

impl Account {
    /// Account with no tier metadata.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            tier: None,
            weight: None,
        }
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Case-insensitive identity check.
    pub fn is(&self, identifier: &str) -> bool {
        self.identifier.eq_ignore_ascii_case(identifier.trim())
    }
}

/// One row of the external tier file. Extra presentation fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TierEntry {
    pub handle: String,
    #[serde(default)]
    pub tier: Option<u8>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Read-only lookup keyed by lower-cased handle.
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    by_handle: HashMap<String, TierEntry>,
}

impl TierTable {
    pub fn from_entries<I: IntoIterator<Item = TierEntry>>(entries: I) -> Self {
        let mut by_handle = HashMap::new();
        for e in entries {
            let key = normalize_handle(&e.handle);
            if key.is_empty() {
                continue;
            }
            // first row wins, later duplicates are ignored
            by_handle.entry(key).or_insert(e);
        }
        Self { by_handle }
    }

    /// Parse a JSON array of tier rows.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let rows: Vec<TierEntry> = serde_json::from_str(s)?;
        Ok(Self::from_entries(rows))
    }

    /// Load the table from a JSON file.
    /// Falls back to an empty table (with a warning) if the file is absent or unreadable.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "tier table not readable; no tier bonuses this run");
                return Self::default();
            }
        };
        match Self::from_json_str(&content) {
            Ok(t) => {
                tracing::debug!(path = %path.display(), entries = t.len(), "tier table loaded");
                t
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "tier table malformed; no tier bonuses this run");
                Self::default()
            }
        }
    }

    pub fn get(&self, handle: &str) -> Option<&TierEntry> {
        self.by_handle.get(&normalize_handle(handle))
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

/// The ordered roster for one run, with tier metadata already joined in.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    accounts: Vec<Account>,
}

impl SourceRegistry {
    /// Build the roster from configured identifiers.
    /// Blank entries are skipped and case-insensitive duplicates collapse to the first one.
    pub fn build<S: AsRef<str>>(identifiers: &[S], tiers: &TierTable) -> Self {
        let mut accounts: Vec<Account> = Vec::with_capacity(identifiers.len());
        for raw in identifiers {
            let id = raw.as_ref().trim().trim_start_matches('@');
            if id.is_empty() || accounts.iter().any(|a| a.is(id)) {
                continue;
            }
            let mut acc = Account::new(id);
            if let Some(row) = tiers.get(id) {
                acc.tier = row.tier;
                acc.weight = row.weight;
            }
            accounts.push(acc);
        }
        Self { accounts }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn find(&self, identifier: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.is(identifier))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn normalize_handle(s: &str) -> String {
    s.trim().trim_start_matches('@').to_ascii_lowercase()
}
