// src/cache/mod.rs
//! Single-slot async cache with a validity window.
//!
//! - The first `get` (or the first after the window expires) starts a load and
//!   stamps the refresh time immediately, so callers arriving mid-load share it.
//! - A failed load is logged and the last good value (or `T::default()`) is served.
//! - `set` installs a value out-of-band and restarts the window.

pub mod friends;
pub mod last_post;

pub use friends::FriendsCache;
pub use last_post::LastPostCache;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::counter;
use tokio::time::Instant;

type Loader<T> = dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync;

/// `None` means the load failed (already logged).
type Pending<T> = Shared<BoxFuture<'static, Option<T>>>;

struct Entry<T> {
    refreshed_at: Option<Instant>,
    pending: Option<Pending<T>>,
    last_good: T,
    /// Bumped by every load start and every `set`; a finished load only
    /// becomes `last_good` if nothing newer happened meanwhile.
    generation: u64,
}

pub struct TimedCache<T> {
    name: &'static str,
    validity: Duration,
    loader: Arc<Loader<T>>,
    entry: Mutex<Entry<T>>,
}

impl<T> TimedCache<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new<F>(name: &'static str, validity: Duration, loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync + 'static,
    {
        Self {
            name,
            validity,
            loader: Arc::new(loader),
            entry: Mutex::new(Entry {
                refreshed_at: None,
                pending: None,
                last_good: T::default(),
                generation: 0,
            }),
        }
    }

    fn start_load(&self) -> Pending<T> {
        let name = self.name;
        let fut = (self.loader)();
        async move {
            match fut.await {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(target: "cache", cache = name, error = ?e, "refresh failed; serving stale value");
                    counter!("cache_refresh_failures_total", "cache" => name).increment(1);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    pub async fn get(&self) -> T {
        let (pending, generation) = {
            let mut e = self.entry.lock().expect("cache mutex poisoned");
            let expired = e
                .refreshed_at
                .map_or(true, |at| at.elapsed() > self.validity);

            let reuse = if expired { None } else { e.pending.clone() };
            let pending = match reuse {
                Some(p) => p,
                None => {
                    tracing::debug!(target: "cache", cache = self.name, "refreshing");
                    let p = self.start_load();
                    e.refreshed_at = Some(Instant::now());
                    e.generation += 1;
                    e.pending = Some(p.clone());
                    p
                }
            };
            (pending, e.generation)
        };

        let outcome = pending.await;

        let mut e = self.entry.lock().expect("cache mutex poisoned");
        match outcome {
            Some(v) => {
                if e.generation == generation {
                    e.last_good = v.clone();
                }
                v
            }
            None => e.last_good.clone(),
        }
    }

    pub fn set(&self, value: T) {
        let mut e = self.entry.lock().expect("cache mutex poisoned");
        e.refreshed_at = Some(Instant::now());
        e.generation += 1;
        e.last_good = value.clone();
        e.pending = Some(futures::future::ready(Some(value)).boxed().shared());
    }
}
