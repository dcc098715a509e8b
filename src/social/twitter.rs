// src/social/twitter.rs
//! reqwest adapter for the v1.1 REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use super::oauth::{self, percent_encode};
use super::{AccountId, Identity, Post, PostId, SearchPage, SearchQuery, SocialClient};
use crate::config::Credentials;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

/// `created_at` as the v1.1 API renders it, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FMT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Deserialize)]
struct RawUser {
    id_str: String,
    #[serde(default)]
    screen_name: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    id_str: String,
    created_at: String,
    #[serde(default, alias = "full_text")]
    text: String,
    user: RawUser,
    /// Present only on retweets.
    #[serde(default)]
    retweeted_status: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct RawSearchMetadata {
    #[serde(default)]
    max_id_str: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    statuses: Vec<RawStatus>,
    search_metadata: Option<RawSearchMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawFriendIds {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawLatestStatus {
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct RawUserShow {
    #[serde(default)]
    status: Option<RawLatestStatus>,
}

#[derive(Debug, Deserialize)]
struct RawCredentials {
    screen_name: String,
    #[serde(default)]
    name: String,
}

fn parse_created_at(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(s, CREATED_AT_FMT)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("bad created_at: {s}"))
}

/// The one place a wire status becomes a [`Post`].
fn into_post(raw: RawStatus) -> Result<Post> {
    Ok(Post {
        created_at: parse_created_at(&raw.created_at)?,
        is_original: raw.retweeted_status.is_none(),
        id: PostId(raw.id_str),
        author_id: AccountId(raw.user.id_str),
        author_screen_name: raw.user.screen_name,
        author_name: raw.user.name,
        text: raw.text,
    })
}

fn into_page(raw: RawSearch) -> SearchPage {
    let mut posts = Vec::with_capacity(raw.statuses.len());
    for s in raw.statuses {
        let id = s.id_str.clone();
        match into_post(s) {
            Ok(p) => posts.push(p),
            Err(e) => tracing::warn!(target: "listener", id = %id, error = ?e, "skipping malformed status"),
        }
    }
    SearchPage {
        posts,
        max_id: raw
            .search_metadata
            .and_then(|m| m.max_id_str)
            .filter(|s| !s.is_empty()),
    }
}

pub struct TwitterClient {
    http: Client,
    base: String,
    creds: Credentials,
}

impl TwitterClient {
    pub fn new(creds: Credentials, base: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("launch-repost-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            creds,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        let auth = oauth::authorization_header(&self.creds, "GET", &url, params)?;

        let full = if params.is_empty() {
            url
        } else {
            let qs = params
                .iter()
                .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{qs}")
        };

        self.http
            .get(&full)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?
            .error_for_status()
            .with_context(|| format!("GET {path} non-2xx"))?
            .json::<T>()
            .await
            .with_context(|| format!("parse {path}"))
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let auth = oauth::authorization_header(&self.creds, "POST", &url, &[])?;
        self.http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?
            .error_for_status()
            .with_context(|| format!("POST {path} non-2xx"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SocialClient for TwitterClient {
    async fn verify_identity(&self) -> Result<Identity> {
        let raw: RawCredentials = self
            .get_json(
                "account/verify_credentials.json",
                &[("include_entities", "false"), ("skip_status", "true")],
            )
            .await?;
        Ok(Identity {
            screen_name: raw.screen_name,
            name: raw.name,
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.q.as_str()),
            ("include_entities", "false"),
            ("result_type", "recent"),
        ];
        if let Some(since) = query.since_id.as_deref() {
            params.push(("since_id", since));
        }
        let raw: RawSearch = self.get_json("search/tweets.json", &params).await?;
        Ok(into_page(raw))
    }

    async fn friend_ids(&self, count: u32) -> Result<Vec<AccountId>> {
        let count = count.to_string();
        let raw: RawFriendIds = self
            .get_json(
                "friends/ids.json",
                &[("count", count.as_str()), ("stringify_ids", "true")],
            )
            .await?;
        Ok(raw.ids.into_iter().map(AccountId).collect())
    }

    async fn latest_post_at(&self, screen_name: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: RawUserShow = self
            .get_json(
                "users/show.json",
                &[("screen_name", screen_name), ("include_entities", "false")],
            )
            .await?;
        raw.status
            .map(|s| parse_created_at(&s.created_at))
            .transpose()
    }

    async fn repost(&self, id: &PostId) -> Result<()> {
        self.post_empty(&format!("statuses/retweet/{}.json", percent_encode(&id.0)))
            .await
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}
