// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "CT_FEED_CONFIG_PATH";
pub const ENV_OUTPUT_PATH: &str = "CT_FEED_OUTPUT_PATH";
pub const ENV_LIMIT: &str = "CT_FEED_LIMIT";

pub const DEFAULT_CONFIG_TOML: &str = "config/ct_feed.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/ct_feed.json";
pub const DEFAULT_OUTPUT_PATH: &str = "src/data/ct-feed.json";
pub const DEFAULT_LIMIT: usize = 3;

const DEFAULT_ACCOUNTS: &[&str] = &[
    "0xansem",
    "MustStopMurad",
    "KookCapitalLLC",
    "frankdegods",
    "cobie",
    "gainzy222",
    "blknoiz06",
    "loopifyyy",
    "BasedKarbon",
    "notthreadguy",
    "0xSisyphus",
    "GiganticRebirth",
    "CryptoGodJohn",
    "KingShawnn",
    "9gagcrypto",
];

const DEFAULT_MIRRORS: &[&str] = &[
    "nitter.poast.org",
    "nitter.privacydev.net",
    "nitter.1d4.us",
    "lightbrd.com",
];

const DEFAULT_KEYWORDS: &[&str] = &[
    "meme",
    "sol",
    "solana",
    "alpha",
    "rug",
    "degen",
    "runner",
    "moonshot",
    "gem",
    "pump",
    "dump",
    "narrative",
    "memecoin",
    "bullish",
    "bearish",
    "100x",
    "conviction",
    "accumulate",
];

/// Everything one batch run needs. Every field has a default, so a partial file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of entries in the snapshot.
    pub limit: usize,
    pub output_path: PathBuf,
    /// Optional account → tier JSON table.
    pub tiers_path: Option<PathBuf>,
    /// Optional Prometheus textfile written after each run.
    pub metrics_path: Option<PathBuf>,
    pub accounts: Vec<String>,
    pub fetch: FetchCfg,
    pub parse: ParseCfg,
    pub scoring: ScoringCfg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchCfg {
    /// Tried in this order for every account.
    pub mirrors: Vec<String>,
    pub scheme: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Accounts fetched at once; 1 means strictly sequential.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParseCfg {
    /// Host that permalinks are rewritten to.
    pub canonical_host: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
    pub keywords: Vec<String>,
    pub keyword_bonus: f64,
    pub cashtag_bonus: f64,
    pub tier_bonus: f64,
    pub privileged_tier: u8,
    pub recency_budget_hours: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            tiers_path: Some(PathBuf::from("src/data/kol-accounts.json")),
            metrics_path: None,
            accounts: DEFAULT_ACCOUNTS.iter().map(|s| s.to_string()).collect(),
            fetch: FetchCfg::default(),
            parse: ParseCfg::default(),
            scoring: ScoringCfg::default(),
        }
    }
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(),
            scheme: "https".to_string(),
            user_agent: "MemeDesk-CT-Feed/1.0".to_string(),
            timeout_secs: 10,
            concurrency: 4,
        }
    }
}

impl Default for ParseCfg {
    fn default() -> Self {
        Self {
            canonical_host: "x.com".to_string(),
        }
    }
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            keyword_bonus: 2.0,
            cashtag_bonus: 3.0,
            tier_bonus: 2.0,
            privileged_tier: 1,
            recency_budget_hours: 10.0,
        }
    }
}

impl FetchCfg {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl PipelineConfig {
    /// Trim lists, drop empties, dedup (case-insensitive, order kept) and reject unusable values.
    pub fn validated(mut self) -> Result<Self> {
        self.accounts = clean_list(self.accounts);
        self.fetch.mirrors = clean_list(self.fetch.mirrors);
        self.scoring.keywords = clean_list(self.scoring.keywords);
        self.fetch.concurrency = self.fetch.concurrency.max(1);

        if self.accounts.is_empty() {
            bail!("config has no accounts");
        }
        if self.fetch.mirrors.is_empty() {
            bail!("config has no mirrors");
        }
        if self.limit == 0 {
            bail!("limit must be at least 1");
        }
        if !self.scoring.recency_budget_hours.is_finite() || self.scoring.recency_budget_hours < 0.0
        {
            bail!("scoring.recency_budget_hours must be a non-negative number");
        }
        Ok(self)
    }

    /// Apply CT_FEED_OUTPUT_PATH / CT_FEED_LIMIT if present. Invalid limits are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(p) = std::env::var(ENV_OUTPUT_PATH) {
            if !p.trim().is_empty() {
                self.output_path = PathBuf::from(p.trim());
            }
        }
        if let Some(n) = parse_limit_env(std::env::var(ENV_LIMIT).ok()) {
            self.limit = n;
        }
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $CT_FEED_CONFIG_PATH
/// 2) config/ct_feed.toml
/// 3) config/ct_feed.json
/// 4) compiled-in defaults
///
/// Env overrides are applied last, then the result is validated.
pub fn load_config_default() -> Result<PipelineConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else if Path::new(DEFAULT_CONFIG_TOML).exists() {
        load_config_from(Path::new(DEFAULT_CONFIG_TOML))?
    } else if Path::new(DEFAULT_CONFIG_JSON).exists() {
        load_config_from(Path::new(DEFAULT_CONFIG_JSON))?
    } else {
        tracing::debug!("no config file found; using built-in defaults");
        PipelineConfig::default()
    };
    cfg.apply_env_overrides();
    cfg.validated()
}

fn parse_config(s: &str, hint_ext: &str) -> Result<PipelineConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // Unknown extension: JSON if it looks like an object, else TOML.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

fn parse_limit_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_roster() {
        let cfg = PipelineConfig::default().validated().unwrap();
        assert_eq!(cfg.accounts.len(), 15);
        assert_eq!(cfg.fetch.mirrors[0], "nitter.poast.org");
        assert_eq!(cfg.limit, 3);
        assert!(cfg.scoring.keywords.iter().any(|k| k == "moonshot"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = r#"
limit = 5
accounts = [" alice ", "", "Alice", "bob"]

[fetch]
mirrors = ["m1.example", "m2.example"]
"#;
        let cfg = parse_config(toml, "toml").unwrap().validated().unwrap();
        assert_eq!(cfg.limit, 5);
        assert_eq!(cfg.accounts, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(cfg.fetch.user_agent, "MemeDesk-CT-Feed/1.0");
        assert_eq!(cfg.parse.canonical_host, "x.com");
    }

    #[test]
    fn json_and_sniffed_formats_work() {
        let json = r#"{"limit": 2, "fetch": {"mirrors": ["a.example"], "concurrency": 0}}"#;
        let cfg = parse_config(json, "").unwrap().validated().unwrap();
        assert_eq!(cfg.limit, 2);
        assert_eq!(cfg.fetch.concurrency, 1);
    }

    #[test]
    fn empty_mirrors_and_zero_limit_are_rejected() {
        let no_mirrors = parse_config("[fetch]\nmirrors = []", "toml").unwrap();
        assert!(no_mirrors.validated().is_err());
        let zero = parse_config("limit = 0", "toml").unwrap();
        assert!(zero.validated().is_err());
    }

    #[test]
    fn limit_env_parsing() {
        assert_eq!(parse_limit_env(Some(" 7 ".into())), Some(7));
        assert_eq!(parse_limit_env(Some("0".into())), None);
        assert_eq!(parse_limit_env(Some("abc".into())), None);
        assert_eq!(parse_limit_env(None), None);
    }
}
