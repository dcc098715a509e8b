// tests/config_env.rs
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::{env, fs};

use launch_repost_bot::config::{apply_env_overrides, log_env_overrides, BotConfig, SkipReason};

const KEYS: [&str; 6] = [
    "API_KEY",
    "API_SECRET",
    "ACCESS_TOKEN",
    "ACCESS_TOKEN_SECRET",
    "SEARCH_TAGS",
    "A",
];

fn clear() {
    for k in KEYS {
        env::remove_var(k);
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn captured_logs(f: impl FnOnce()) -> String {
    let cap = Capture::default();
    let writer = cap.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    cap.text()
}

#[serial_test::serial]
#[test]
fn env_json_overrides_feed_the_config() {
    clear();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join(".env.json");
    fs::write(
        &p,
        r##"{
            "API_KEY": "key",
            "API_SECRET": "secret",
            "ACCESS_TOKEN": "token",
            "ACCESS_TOKEN_SECRET": "token-secret",
            "SEARCH_TAGS": "#OnlyThis"
        }"##,
    )
    .unwrap();

    let applied = apply_env_overrides(&p).unwrap();
    assert_eq!(applied.vars.len(), 5);
    assert!(applied.skipped.is_empty());

    let cfg = BotConfig::from_env().unwrap();
    assert_eq!(cfg.credentials.access_token_secret, "token-secret");
    assert_eq!(cfg.tags, vec!["#OnlyThis".to_string()]);
    clear();
}

#[serial_test::serial]
#[test]
fn missing_or_broken_override_file_is_ignored() {
    clear();
    let dir = tempfile::tempdir().unwrap();

    let absent = apply_env_overrides(dir.path().join("absent.json")).unwrap();
    assert!(absent.vars.is_empty());

    let p = dir.path().join("broken.json");
    fs::write(&p, "{ not json").unwrap();
    assert!(apply_env_overrides(&p).is_err());

    assert!(BotConfig::from_env().is_err(), "credentials still missing");
}

#[serial_test::serial]
#[test]
fn unexportable_keys_are_skipped_not_fatal() {
    clear();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join(".env.json");
    fs::write(
        &p,
        r#"{"": "x", "A=B": "y", "NUL\u0000": "z", "API_KEY": "a\u0000b", "API_SECRET": "fine"}"#,
    )
    .unwrap();

    let applied = apply_env_overrides(&p).unwrap();
    assert_eq!(applied.vars.len(), 1);
    assert_eq!(env::var("API_SECRET").as_deref(), Ok("fine"));
    assert!(env::var("API_KEY").is_err());
    assert!(env::var("A").is_err());
    assert_eq!(applied.skipped.len(), 4);
    assert!(applied
        .skipped
        .contains(&("API_KEY".to_string(), SkipReason::InvalidValue)));
    clear();
}

#[serial_test::serial]
#[test]
fn override_problems_reach_the_log() {
    clear();
    let dir = tempfile::tempdir().unwrap();

    let p = dir.path().join("broken.json");
    fs::write(&p, "{ not json").unwrap();
    let outcome = apply_env_overrides(&p);
    let out = captured_logs(|| log_env_overrides(&outcome));
    assert!(out.contains("Could not read local environment overrides"), "{out}");

    let p = dir.path().join("partial.json");
    fs::write(&p, r#"{"A=B": "y", "LIST": [1], "API_SECRET": "s"}"#).unwrap();
    let outcome = apply_env_overrides(&p);
    let out = captured_logs(|| log_env_overrides(&outcome));
    assert!(out.contains("A=B"), "{out}");
    assert!(out.contains("LIST"), "{out}");
    assert!(out.contains("applied local environment overrides"), "{out}");
    clear();
}
