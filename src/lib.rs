// src/lib.rs
// Public library surface for integration tests and the binaries.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod history;
pub mod listener;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod social;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::app::{run, AppContext};
pub use crate::cache::{FriendsCache, LastPostCache, TimedCache};
pub use crate::config::BotConfig;
pub use crate::listener::{PostListener, PostStream, SearchCursor};
pub use crate::pipeline::{DecisionPipeline, IgnoreReason, Verdict};
pub use crate::social::{AccountId, Post, PostId, SocialClient};
