use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Per-target filter directives, e.g. `purge_cache::planner=debug`.
pub const LOG_FILTER_ENV: &str = "PURGE_CACHE_LOG";

/// Install a global tracing subscriber using the provided logging settings.
///
/// `logging.level` is the default; directives in `PURGE_CACHE_LOG` refine it.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .with_env_var(LOG_FILTER_ENV)
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(InfraError::from)
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "purge_cache_requests_total",
            Unit::Count,
            "Total number of purge requests sent, labelled by mode."
        );
        describe_counter!(
            "purge_cache_failures_total",
            Unit::Count,
            "Total number of failed purges, labelled by error kind."
        );
        describe_histogram!(
            "purge_cache_remote_ms",
            Unit::Milliseconds,
            "Cloudflare purge API round-trip latency in milliseconds."
        );
    });
}
