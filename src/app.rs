// src/app.rs
//! Wiring: every long-lived component is built once here and handed down.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::api::{self, ApiState};
use crate::cache::{FriendsCache, LastPostCache};
use crate::config::BotConfig;
use crate::history::History;
use crate::listener::{PostListener, DEFAULT_CHANNEL_CAPACITY};
use crate::metrics::Metrics;
use crate::pipeline::DecisionPipeline;
use crate::social::twitter::TwitterClient;
use crate::social::{Identity, SocialClient};

const HISTORY_CAPACITY: usize = 500;

pub struct AppContext {
    pub client: Arc<dyn SocialClient>,
    pub identity: Identity,
    pub friends: Arc<FriendsCache>,
    pub last_post: Arc<LastPostCache>,
    pub history: Arc<History>,
}

impl AppContext {
    /// Resolve who we are, then build the caches around that identity.
    pub async fn build(client: Arc<dyn SocialClient>) -> Result<Self> {
        let identity = client
            .verify_identity()
            .await
            .context("resolve operator identity")?;

        tracing::info!(
            "Using screen name \"{}\" (name \"{}\")",
            identity.screen_name,
            identity.name
        );

        Ok(Self::with_identity(client, identity))
    }

    pub fn with_identity(client: Arc<dyn SocialClient>, identity: Identity) -> Self {
        let friends = Arc::new(FriendsCache::new(client.clone()));
        let last_post = Arc::new(LastPostCache::new(
            client.clone(),
            identity.screen_name.clone(),
        ));
        Self {
            client,
            identity,
            friends,
            last_post,
            history: Arc::new(History::with_capacity(HISTORY_CAPACITY)),
        }
    }

    pub fn pipeline(&self) -> DecisionPipeline {
        DecisionPipeline::new(
            self.client.clone(),
            self.friends.clone(),
            self.last_post.clone(),
            self.history.clone(),
        )
    }

    pub fn listener(&self, tags: Vec<String>) -> PostListener {
        PostListener::new(self.client.clone(), tags)
    }

    pub fn api_state(&self) -> ApiState {
        ApiState {
            history: self.history.clone(),
        }
    }
}

/// Run the bot against the live API until Ctrl-C or a fatal server error.
pub async fn run(config: BotConfig) -> Result<()> {
    let client: Arc<dyn SocialClient> = Arc::new(TwitterClient::new(
        config.credentials.clone(),
        config.api_base.clone(),
    )?);
    run_with_client(config, client).await
}

pub async fn run_with_client(config: BotConfig, client: Arc<dyn SocialClient>) -> Result<()> {
    let ctx = AppContext::build(client).await?;

    let mut router = api::router(ctx.api_state());
    match Metrics::init(config.poll_interval.as_secs()) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics exporter disabled"),
    }
    let mut server = tokio::spawn(api::serve(router, config.http_port));

    tracing::info!(
        tags = %config.tags.join(" OR "),
        interval_secs = config.poll_interval.as_secs(),
        "listening for posts"
    );
    let (stream, listener_task) = ctx
        .listener(config.tags.clone())
        .spawn(config.poll_interval, DEFAULT_CHANNEL_CAPACITY);
    let pipeline = ctx.pipeline();

    let outcome = tokio::select! {
        _ = pipeline.run(stream) => Ok(()),
        res = &mut server => match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(anyhow!("http server task: {e}")),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    };

    listener_task.abort();
    server.abort();
    outcome
}
