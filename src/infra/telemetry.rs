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

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
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
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "ikarus_cache_hit_total",
            Unit::Count,
            "Total number of resource reads served from a fresh artifact."
        );
        describe_counter!(
            "ikarus_cache_rebuild_total",
            Unit::Count,
            "Total number of resource rebuilds caused by a missing or stale artifact."
        );
        describe_counter!(
            "ikarus_cache_corrupt_total",
            Unit::Count,
            "Total number of fresh artifacts that failed to decode."
        );
        describe_counter!(
            "ikarus_event_fire_total",
            Unit::Count,
            "Total number of event fires dispatched to listener chains."
        );
        describe_histogram!(
            "ikarus_dispatch_ms",
            Unit::Milliseconds,
            "Request dispatch latency in milliseconds."
        );
    });
}
