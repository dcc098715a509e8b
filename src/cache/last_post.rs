// src/cache/last_post.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use super::TimedCache;
use crate::social::SocialClient;

pub const LAST_POST_VALIDITY: Duration = Duration::from_secs(45);

/// When the operator last posted. Never posted (or unknown) reads as the epoch.
pub struct LastPostCache {
    cache: TimedCache<DateTime<Utc>>,
}

impl LastPostCache {
    pub fn new(client: Arc<dyn SocialClient>, screen_name: impl Into<String>) -> Self {
        Self::with_validity(client, screen_name, LAST_POST_VALIDITY)
    }

    pub fn with_validity(
        client: Arc<dyn SocialClient>,
        screen_name: impl Into<String>,
        validity: Duration,
    ) -> Self {
        let screen_name: Arc<str> = Arc::from(screen_name.into());
        let cache = TimedCache::new("last_post", validity, move || {
            let client = client.clone();
            let screen_name = screen_name.clone();
            async move {
                let at = client.latest_post_at(&screen_name).await?;
                Ok::<_, anyhow::Error>(at.unwrap_or_default())
            }
            .boxed()
        });
        Self { cache }
    }

    pub async fn get(&self) -> DateTime<Utc> {
        self.cache.get().await
    }

    /// Record a post made by us just now so the cooldown starts immediately.
    pub fn set(&self, at: DateTime<Utc>) {
        self.cache.set(at);
    }
}
