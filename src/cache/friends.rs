// src/cache/friends.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use super::TimedCache;
use crate::social::{AccountId, SocialClient};

pub const FRIENDS_VALIDITY: Duration = Duration::from_secs(30);

/// Only the first page is fetched; accounts beyond it are never seen as friends.
pub const FRIENDS_PAGE_SIZE: u32 = 500;

/// Accounts the operator follows, refreshed wholesale.
pub struct FriendsCache {
    cache: TimedCache<HashSet<AccountId>>,
}

impl FriendsCache {
    pub fn new(client: Arc<dyn SocialClient>) -> Self {
        Self::with_validity(client, FRIENDS_VALIDITY)
    }

    pub fn with_validity(client: Arc<dyn SocialClient>, validity: Duration) -> Self {
        let cache = TimedCache::new("friends", validity, move || {
            let client = client.clone();
            async move {
                let ids = client.friend_ids(FRIENDS_PAGE_SIZE).await?;
                tracing::debug!(target: "cache", count = ids.len(), "friend list loaded");
                Ok::<_, anyhow::Error>(ids.into_iter().collect::<HashSet<_>>())
            }
            .boxed()
        });
        Self { cache }
    }

    pub async fn is_friend(&self, id: &AccountId) -> bool {
        self.cache.get().await.contains(id)
    }

    pub async fn snapshot(&self) -> HashSet<AccountId> {
        self.cache.get().await
    }
}
