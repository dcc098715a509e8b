// src/listener.rs
//! Search poller. Remembers the newest id it has seen and asks the API only
//! for results after it; every new post goes out through a bounded channel.

use std::cmp::Ordering;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::social::{compare_ids, Post, SearchQuery, SocialClient};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Newest post id observed so far. Empty until the first successful poll; never moves back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCursor(String);

impl SearchCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Move forward to `candidate` if it is newer. Returns whether it moved.
    pub fn advance(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || compare_ids(candidate, &self.0) != Ordering::Greater {
            return false;
        }
        self.0 = candidate.to_string();
        true
    }
}

/// Lazy, single-use sequence of posts produced by a running listener.
pub struct PostStream {
    rx: mpsc::Receiver<Post>,
}

impl PostStream {
    pub fn channel(capacity: usize) -> (mpsc::Sender<Post>, PostStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, PostStream { rx })
    }

    /// `None` once the listener has stopped and everything was drained.
    pub async fn next(&mut self) -> Option<Post> {
        self.rx.recv().await
    }
}

impl futures::Stream for PostStream {
    type Item = Post;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Post>> {
        self.rx.poll_recv(cx)
    }
}

pub struct PostListener {
    client: Arc<dyn SocialClient>,
    tags: Vec<String>,
    cursor: SearchCursor,
}

impl PostListener {
    pub fn new(client: Arc<dyn SocialClient>, tags: Vec<String>) -> Self {
        Self {
            client,
            tags,
            cursor: SearchCursor::default(),
        }
    }

    pub fn cursor(&self) -> &SearchCursor {
        &self.cursor
    }

    /// One search round trip. On success the cursor moves to the newest id in
    /// the batch (or the page's own max id), whatever happens to the posts later.
    /// On failure the cursor is untouched.
    pub async fn poll_once(&mut self) -> Result<Vec<Post>> {
        let since = (!self.cursor.is_empty()).then(|| self.cursor.as_str());
        let query = SearchQuery::for_tags(&self.tags, since);

        let page = self
            .client
            .search(&query)
            .await
            .with_context(|| format!("search via {}", self.client.name()))?;

        if let Some(max_id) = page.max_id.as_deref() {
            self.cursor.advance(max_id);
        }
        for p in &page.posts {
            self.cursor.advance(&p.id.0);
        }

        tracing::debug!(
            target: "listener",
            found = page.posts.len(),
            cursor = self.cursor.as_str(),
            "poll done"
        );
        Ok(page.posts)
    }

    /// Poll immediately, then every `interval`. Posts are sent in API order;
    /// a full channel delays the next poll instead of piling up requests.
    pub fn spawn(mut self, interval: Duration, capacity: usize) -> (PostStream, JoinHandle<()>) {
        let (tx, stream) = PostStream::channel(capacity);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let posts = match self.poll_once().await {
                    Ok(posts) => posts,
                    Err(e) => {
                        tracing::warn!(target: "listener", error = ?e, "poll failed");
                        counter!("poll_errors_total").increment(1);
                        continue;
                    }
                };

                for post in posts {
                    if tx.send(post).await.is_err() {
                        tracing::info!(target: "listener", "consumer gone; stopping");
                        return;
                    }
                }
            }
        });

        (stream, handle)
    }
}
