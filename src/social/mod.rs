// src/social/mod.rs
pub mod mock;
pub mod oauth;
pub mod twitter;

use std::cmp::Ordering;
use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};

/// Opaque account identifier (`id_str` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(pub String);

/// Opaque post identifier (`id_str` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PostId(pub String);

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order two decimal id strings without parsing them into integers.
/// Snowflake ids only grow in length, so a longer id is always newer.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// One search result, normalized at construction time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: AccountId,
    pub author_screen_name: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    /// false when the item is itself a retweet of another post
    pub is_original: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Tags joined with `OR`.
    pub q: String,
    /// Only return results strictly newer than this id.
    pub since_id: Option<String>,
}

impl SearchQuery {
    pub fn for_tags<S: AsRef<str>>(tags: &[S], since_id: Option<&str>) -> Self {
        let q = tags
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(" OR ");
        Self {
            q,
            since_id: since_id.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// In the order the API returned them.
    pub posts: Vec<Post>,
    /// Cursor token reported by the API for this page, if any.
    pub max_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub screen_name: String,
    pub name: String,
}

/// Remote social API used by the bot. Implementations own transport and auth.
#[async_trait::async_trait]
pub trait SocialClient: Send + Sync {
    async fn verify_identity(&self) -> Result<Identity>;
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage>;
    /// First page of followed accounts, at most `count` entries.
    async fn friend_ids(&self, count: u32) -> Result<Vec<AccountId>>;
    /// Creation time of the latest post by `screen_name`, `None` if they never posted.
    async fn latest_post_at(&self, screen_name: &str) -> Result<Option<DateTime<Utc>>>;
    async fn repost(&self, id: &PostId) -> Result<()>;
    fn name(&self) -> &'static str;
}
