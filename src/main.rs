//! Launch repost bot — binary entrypoint.
//! Loads the environment, starts logging, and hands over to `app::run`.

use launch_repost_bot::{app, config, logging, BotConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` then `.env.json`; both optional. Logging may be configured by
    // either, so the outcome is reported once the subscriber is up.
    let overrides = config::load_environment();
    logging::init_tracing();
    config::log_env_overrides(&overrides);

    let cfg = BotConfig::from_env()?;
    tracing::info!(credentials = ?cfg.credentials, api = %cfg.api_base, "config loaded");

    app::run(cfg).await
}
