//! pipeline.rs — per-post eligibility chain and the repost action.
//!
//! Checks run in a fixed order and the first failure wins:
//! originality, authorship, recency, cooldown.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::cache::{FriendsCache, LastPostCache};
use crate::history::History;
use crate::listener::PostStream;
use crate::social::{Post, SocialClient};

/// Posts older than this no longer describe an upcoming event.
pub const MAX_POST_AGE: Duration = Duration::minutes(30);

/// Minimum gap between two of our own posts.
pub const COOLDOWN: Duration = Duration::minutes(35);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IgnoreReason {
    NotOriginal,
    NotFriend,
    TooOld { age_secs: i64 },
    CoolingDown { since_last_post_secs: i64 },
}

impl IgnoreReason {
    pub fn label(&self) -> &'static str {
        match self {
            IgnoreReason::NotOriginal => "not_original",
            IgnoreReason::NotFriend => "not_friend",
            IgnoreReason::TooOld { .. } => "too_old",
            IgnoreReason::CoolingDown { .. } => "cooling_down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Repost,
    Ignore(IgnoreReason),
    /// All checks passed but the remote call failed; cooldown not started.
    RepostFailed,
}

impl Verdict {
    pub fn is_repost(&self) -> bool {
        matches!(self, Verdict::Repost)
    }
}

fn minutes(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 60_000.0
}

pub struct DecisionPipeline {
    client: Arc<dyn SocialClient>,
    friends: Arc<FriendsCache>,
    last_post: Arc<LastPostCache>,
    history: Arc<History>,
}

impl DecisionPipeline {
    pub fn new(
        client: Arc<dyn SocialClient>,
        friends: Arc<FriendsCache>,
        last_post: Arc<LastPostCache>,
        history: Arc<History>,
    ) -> Self {
        Self {
            client,
            friends,
            last_post,
            history,
        }
    }

    /// Run the filter chain without acting on it.
    pub async fn evaluate(&self, post: &Post, now: DateTime<Utc>) -> Verdict {
        if !post.is_original {
            return Verdict::Ignore(IgnoreReason::NotOriginal);
        }

        if !self.friends.is_friend(&post.author_id).await {
            return Verdict::Ignore(IgnoreReason::NotFriend);
        }

        let age = now - post.created_at;
        if age > MAX_POST_AGE {
            return Verdict::Ignore(IgnoreReason::TooOld {
                age_secs: age.num_seconds(),
            });
        }

        let since_last = now - self.last_post.get().await;
        if since_last < COOLDOWN {
            return Verdict::Ignore(IgnoreReason::CoolingDown {
                since_last_post_secs: since_last.num_seconds(),
            });
        }

        Verdict::Repost
    }

    /// Evaluate, repost on a pass, and start the cooldown right away.
    /// `now` is when the post was picked up; the cooldown is stamped with the
    /// moment the repost call returned.
    pub async fn handle(&self, post: &Post, now: DateTime<Utc>) -> Verdict {
        counter!("posts_seen_total").increment(1);
        let started = Instant::now();

        let verdict = match self.evaluate(post, now).await {
            Verdict::Repost => self.repost(post, now, started).await,
            other => other,
        };

        if let Verdict::Ignore(reason) = verdict {
            counter!("posts_ignored_total", "reason" => reason.label()).increment(1);
            self.log_ignore(post, reason);
        }

        self.history.push(post, verdict, now);
        verdict
    }

    async fn repost(&self, post: &Post, now: DateTime<Utc>, started: Instant) -> Verdict {
        tracing::info!(
            target: "pipeline",
            id = %post.id,
            author = %post.author_screen_name,
            "Retweeting \"{}\" by {} (\"{}\")",
            post.text,
            post.author_screen_name,
            post.author_name
        );
        match self.client.repost(&post.id).await {
            Ok(()) => {
                let took = Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());
                self.last_post.set(now + took);
                counter!("reposts_total").increment(1);
                Verdict::Repost
            }
            Err(e) => {
                tracing::warn!(target: "pipeline", id = %post.id, error = ?e, "repost failed");
                counter!("repost_failures_total").increment(1);
                Verdict::RepostFailed
            }
        }
    }

    fn log_ignore(&self, post: &Post, reason: IgnoreReason) {
        match reason {
            IgnoreReason::NotOriginal | IgnoreReason::NotFriend => {
                tracing::debug!(
                    target: "pipeline",
                    id = %post.id,
                    author = %post.author_screen_name,
                    reason = reason.label(),
                    "ignoring post"
                );
            }
            IgnoreReason::TooOld { age_secs } => {
                tracing::info!(
                    target: "pipeline",
                    id = %post.id,
                    "Ignoring \"{}\" by {} (\"{}\") as it is too old ({:.1} min).",
                    post.text,
                    post.author_screen_name,
                    post.author_name,
                    minutes(Duration::seconds(age_secs))
                );
            }
            IgnoreReason::CoolingDown {
                since_last_post_secs,
            } => {
                tracing::info!(
                    target: "pipeline",
                    id = %post.id,
                    "Ignoring \"{}\" by {} (\"{}\") as we already posted about the launch {:.1} min ago.",
                    post.text,
                    post.author_screen_name,
                    post.author_name,
                    minutes(Duration::seconds(since_last_post_secs))
                );
            }
        }
    }

    /// Drain the stream one post at a time; each post is fully handled
    /// before the next one is pulled. Returns when the listener stops.
    pub async fn run(&self, mut stream: PostStream) {
        while let Some(post) = stream.next().await {
            self.handle(&post, Utc::now()).await;
        }
        tracing::info!(target: "pipeline", "post stream closed");
    }
}
