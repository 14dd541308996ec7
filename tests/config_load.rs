// tests/config_load.rs
use ct_feed::ingest::config::{load_config_default, load_config_from};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("ct_feed.toml");
    fs::write(
        &p_toml,
        r#"
limit = 4
accounts = ["cobie", " COBIE ", "", "frankdegods"]

[fetch]
mirrors = ["nitter.poast.org", "lightbrd.com"]
timeout_secs = 3

[scoring]
keywords = ["gem", "Runner"]
"#,
    )
    .unwrap();
    let t = load_config_from(&p_toml).unwrap().validated().unwrap();
    assert_eq!(t.limit, 4);
    assert_eq!(t.accounts, vec!["cobie".to_string(), "frankdegods".to_string()]);
    assert_eq!(t.fetch.mirrors.len(), 2);
    assert_eq!(t.fetch.timeout().as_secs(), 3);
    assert_eq!(t.scoring.keywords, vec!["gem".to_string(), "Runner".to_string()]);

    let p_json = dir.path().join("ct_feed.json");
    fs::write(&p_json, r#"{"output_path": "out/feed.json", "fetch": {"mirrors": ["a.example"]}}"#)
        .unwrap();
    let j = load_config_from(&p_json).unwrap().validated().unwrap();
    assert_eq!(j.output_path, std::path::PathBuf::from("out/feed.json"));
    assert_eq!(j.accounts.len(), 15);
}

#[test]
fn broken_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("ct_feed.toml");
    fs::write(&p, "limit = [").unwrap();
    assert!(load_config_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("CT_FEED_CONFIG_PATH");
    env::remove_var("CT_FEED_OUTPUT_PATH");
    env::remove_var("CT_FEED_LIMIT");

    // 1) Nothing on disk → built-in defaults
    let d = load_config_default().unwrap();
    assert_eq!(d.limit, 3);
    assert_eq!(d.fetch.mirrors[0], "nitter.poast.org");

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("ct_feed.toml"), "limit = 7").unwrap();
    assert_eq!(load_config_default().unwrap().limit, 7);

    // 3) Env path wins over the fallback
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{"limit": 9}"#).unwrap();
    env::set_var("CT_FEED_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().limit, 9);

    // 4) Value overrides apply on top; junk limits are ignored
    env::set_var("CT_FEED_LIMIT", "2");
    env::set_var("CT_FEED_OUTPUT_PATH", "public/ct.json");
    let o = load_config_default().unwrap();
    assert_eq!(o.limit, 2);
    assert_eq!(o.output_path, std::path::PathBuf::from("public/ct.json"));
    env::set_var("CT_FEED_LIMIT", "zero");
    assert_eq!(load_config_default().unwrap().limit, 9);

    // 5) Env path to nowhere is an error
    env::set_var("CT_FEED_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load_config_default().is_err());

    env::remove_var("CT_FEED_CONFIG_PATH");
    env::remove_var("CT_FEED_OUTPUT_PATH");
    env::remove_var("CT_FEED_LIMIT");
    env::set_current_dir(&old).unwrap();
}
