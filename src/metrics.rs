use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("posts_seen_total", "Posts handed to the decision pipeline.");
        describe_counter!(
            "posts_ignored_total",
            "Posts dropped by the pipeline, labelled by reason."
        );
        describe_counter!("reposts_total", "Successful retweets.");
        describe_counter!("repost_failures_total", "Retweet calls that failed.");
        describe_counter!("poll_errors_total", "Search polls that failed.");
        describe_counter!(
            "cache_refresh_failures_total",
            "Cache loads that failed and fell back to the stale value."
        );
        describe_gauge!("poll_interval_secs", "Configured search poll interval.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once per process.
    pub fn init(poll_interval_secs: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        ensure_metrics_described();
        gauge!("poll_interval_secs").set(poll_interval_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
