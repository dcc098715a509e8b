// src/config.rs
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use anyhow::{anyhow, Context, Result};

use crate::social::twitter::DEFAULT_API_BASE;

pub const ENV_OVERRIDES_FILE: &str = ".env.json";

/// Countdown hashtags the bot reacts to.
pub const DEFAULT_TAGS: &[&str] = &[
    "#StarshipLaunchIn5min",
    "#StarshipLaunchIn10min",
    "#StarshipLaunchIn15min",
    "#StarshipLaunchIn20min",
    "#StarshipLaunchIn25min",
    "#StarshipLaunchIn30min",
];

/// Search is limited to 75 calls per 15 minutes; 60 per window leaves headroom.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60 / 60);

pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_len", &self.api_key.len())
            .field("access_token_len", &self.access_token.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub credentials: Credentials,
    pub tags: Vec<String>,
    pub poll_interval: Duration,
    pub http_port: u16,
    pub api_base: String,
}

impl BotConfig {
    /// Read from the process environment (after `.env` / `.env.json` were applied).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Missing {key} env var"))
        };

        let credentials = Credentials {
            api_key: required("API_KEY")?,
            api_secret: required("API_SECRET")?,
            access_token: required("ACCESS_TOKEN")?,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
        };

        let tags = lookup("SEARCH_TAGS")
            .map(|raw| parse_tags(&raw))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TAGS.iter().map(|s| s.to_string()).collect());

        let poll_interval = match lookup("POLL_INTERVAL_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("POLL_INTERVAL_SECS is not a number: {v}"))?;
                if secs == 0 {
                    anyhow::bail!("POLL_INTERVAL_SECS must be > 0");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let http_port = match lookup("HTTP_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("HTTP_PORT is not a port: {v}"))?,
            None => DEFAULT_HTTP_PORT,
        };

        let api_base = lookup("TWITTER_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            credentials,
            tags,
            poll_interval,
            http_port,
            api_base,
        })
    }
}

/// Comma separated; blanks dropped; a missing `#` is added.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.starts_with('#') {
                t.to_string()
            } else {
                format!("#{t}")
            }
        })
        .collect()
}

/// Why a `.env.json` entry was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkipReason {
    /// null, array or object
    NotScalar,
    /// empty, or contains `=` or NUL
    InvalidName,
    /// contains NUL
    InvalidValue,
}

/// Entries of a `.env.json` file that can be exported, plus the ones that can't.
#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub vars: HashMap<String, String>,
    pub skipped: Vec<(String, SkipReason)>,
}

fn valid_var_name(k: &str) -> bool {
    !k.is_empty() && !k.contains('=') && !k.contains('\0')
}

/// Parse a flat JSON object. Scalars become strings; anything that
/// `env::set_var` would reject is reported in `skipped` instead.
pub fn parse_env_overrides(content: &str) -> Result<EnvOverrides> {
    let map: HashMap<String, serde_json::Value> =
        serde_json::from_str(content).context("env overrides must be a JSON object")?;

    let mut out = EnvOverrides::default();
    for (k, v) in map {
        let value = match v {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => {
                out.skipped.push((k, SkipReason::NotScalar));
                continue;
            }
        };
        if !valid_var_name(&k) {
            out.skipped.push((k, SkipReason::InvalidName));
        } else if value.contains('\0') {
            out.skipped.push((k, SkipReason::InvalidValue));
        } else {
            out.vars.insert(k, value);
        }
    }
    Ok(out)
}

/// Apply `.env.json`-style overrides to the process environment.
/// A missing file yields an empty result; an unreadable or malformed one is
/// an error and nothing is set.
pub fn apply_env_overrides<P: AsRef<Path>>(path: P) -> Result<EnvOverrides> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(EnvOverrides::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let overrides =
        parse_env_overrides(&content).with_context(|| format!("parsing {}", path.display()))?;
    for (k, v) in &overrides.vars {
        env::set_var(k, v);
    }
    Ok(overrides)
}

/// `.env` first, then `.env.json` on top. Runs before logging is up, so the
/// outcome is handed back for [`log_env_overrides`].
pub fn load_environment() -> Result<EnvOverrides> {
    let _ = dotenvy::dotenv();
    apply_env_overrides(ENV_OVERRIDES_FILE)
}

pub fn log_env_overrides(outcome: &Result<EnvOverrides>) {
    match outcome {
        Ok(o) => {
            if !o.vars.is_empty() {
                tracing::info!(path = ENV_OVERRIDES_FILE, count = o.vars.len(), "applied local environment overrides");
            }
            for (key, reason) in &o.skipped {
                match reason {
                    SkipReason::NotScalar => {
                        tracing::debug!(path = ENV_OVERRIDES_FILE, key = %key, "skipping non-scalar override")
                    }
                    SkipReason::InvalidName | SkipReason::InvalidValue => {
                        tracing::warn!(path = ENV_OVERRIDES_FILE, key = ?key, ?reason, "skipping override that cannot be exported")
                    }
                }
            }
        }
        Err(e) => {
            tracing::warn!(path = ENV_OVERRIDES_FILE, error = ?e, "Could not read local environment overrides");
        }
    }
}
