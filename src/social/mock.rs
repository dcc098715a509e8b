// src/social/mock.rs
//! Scripted in-memory client for tests and offline demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use super::{AccountId, Identity, PostId, SearchPage, SearchQuery, SocialClient};

#[derive(Debug, Default)]
pub struct MockSocialClient {
    friends: Mutex<Vec<AccountId>>,
    latest_post: Mutex<Option<DateTime<Utc>>>,
    pages: Mutex<VecDeque<Result<SearchPage, String>>>,
    latency: Mutex<Option<Duration>>,

    fail_friends: AtomicBool,
    fail_latest: AtomicBool,
    fail_repost: AtomicBool,

    friend_calls: AtomicUsize,
    latest_calls: AtomicUsize,
    searches: Mutex<Vec<SearchQuery>>,
    reposts: Mutex<Vec<PostId>>,
}

impl MockSocialClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_friends<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_friends(ids);
        self
    }

    pub fn with_latest_post(self, at: Option<DateTime<Utc>>) -> Self {
        self.set_latest_post(at);
        self
    }

    /// Every remote call sleeps this long first (tokio time, so it can be paused).
    pub fn with_latency(self, d: Duration) -> Self {
        *self.latency.lock().expect("mock mutex poisoned") = Some(d);
        self
    }

    pub fn set_friends<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.friends.lock().expect("mock mutex poisoned") =
            ids.into_iter().map(|s| AccountId(s.into())).collect();
    }

    pub fn set_latest_post(&self, at: Option<DateTime<Utc>>) {
        *self.latest_post.lock().expect("mock mutex poisoned") = at;
    }

    pub fn push_page(&self, page: SearchPage) {
        self.pages
            .lock()
            .expect("mock mutex poisoned")
            .push_back(Ok(page));
    }

    pub fn push_search_error(&self, msg: &str) {
        self.pages
            .lock()
            .expect("mock mutex poisoned")
            .push_back(Err(msg.to_string()));
    }

    pub fn fail_friends(&self, on: bool) {
        self.fail_friends.store(on, Ordering::SeqCst);
    }

    pub fn fail_latest(&self, on: bool) {
        self.fail_latest.store(on, Ordering::SeqCst);
    }

    pub fn fail_repost(&self, on: bool) {
        self.fail_repost.store(on, Ordering::SeqCst);
    }

    pub fn friend_calls(&self) -> usize {
        self.friend_calls.load(Ordering::SeqCst)
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<SearchQuery> {
        self.searches.lock().expect("mock mutex poisoned").clone()
    }

    pub fn reposts(&self) -> Vec<PostId> {
        self.reposts.lock().expect("mock mutex poisoned").clone()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().expect("mock mutex poisoned");
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait::async_trait]
impl SocialClient for MockSocialClient {
    async fn verify_identity(&self) -> Result<Identity> {
        Ok(Identity {
            screen_name: "mock_operator".into(),
            name: "Mock Operator".into(),
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        self.searches
            .lock()
            .expect("mock mutex poisoned")
            .push(query.clone());
        self.simulate_latency().await;
        let next = self.pages.lock().expect("mock mutex poisoned").pop_front();
        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(SearchPage::default()),
        }
    }

    async fn friend_ids(&self, count: u32) -> Result<Vec<AccountId>> {
        self.friend_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_friends.load(Ordering::SeqCst) {
            return Err(anyhow!("friends endpoint unavailable"));
        }
        let friends = self.friends.lock().expect("mock mutex poisoned");
        Ok(friends.iter().take(count as usize).cloned().collect())
    }

    async fn latest_post_at(&self, _screen_name: &str) -> Result<Option<DateTime<Utc>>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_latest.load(Ordering::SeqCst) {
            return Err(anyhow!("users/show unavailable"));
        }
        Ok(*self.latest_post.lock().expect("mock mutex poisoned"))
    }

    async fn repost(&self, id: &PostId) -> Result<()> {
        self.simulate_latency().await;
        if self.fail_repost.load(Ordering::SeqCst) {
            return Err(anyhow!("retweet rejected"));
        }
        self.reposts
            .lock()
            .expect("mock mutex poisoned")
            .push(id.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
