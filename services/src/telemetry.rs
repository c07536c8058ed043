use crate::config::{Config, Env};
use anyhow::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::env;
use tracing_stackdriver::CloudTraceConfiguration;
use tracing_subscriber::{
    EnvFilter, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info,blog_services=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global tracing subscriber. Must be called once, before the
/// first span is created.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    match config.environment() {
        Env::Local => {
            // Local development: pretty printing, timestamps in the process timezone (`TZ`)
            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer().with_timer(ChronoLocal::rfc_3339()))
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        Env::Test => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        Env::Prod => {
            // Production: JSON logging with Stackdriver & Cloud Trace
            let project_id = env::var("GOOGLE_CLOUD_PROJECT")
                .context("GOOGLE_CLOUD_PROJECT environment variable is required in production")?;

            // Set the global propagator to trace-context (W3C)
            opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

            let stackdriver_layer = tracing_stackdriver::layer()
                .with_cloud_trace(CloudTraceConfiguration { project_id });

            let otel_layer = tracing_opentelemetry::layer();

            tracing_subscriber::registry()
                .with(env_filter())
                .with(otel_layer)
                .with(stackdriver_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
    }

    Ok(())
}
