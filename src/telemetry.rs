//! Subscriber setup for the CLI and the loader's metrics.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing_log::LogTracer;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_subscriber::{EnvFilter, fmt, layer::Layer, layer::SubscriberExt};

use crate::config::AppConfig;
use crate::error::FailureKind;

/// Errors that can occur while initializing global telemetry.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log tracer bridge: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber for the CLI, once per process.
///
/// Events are written to stderr (json or pretty, per `log_format`) so stdout
/// carries only command output. `log::` records are bridged into tracing.
/// Later calls are no-ops.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let result = install(config);
    if result.is_err() {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

fn install(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        // A bridge installed by an earlier caller is fine; any other logger is not.
        if !type_name_of_val(log::logger()).contains("LogTracer") {
            return Err(err.into());
        }
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let output = if config.log_format == "pretty" {
        fmt::layer().pretty().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    // The bridge is installed above; `try_init` would install a second one.
    set_global_default(tracing_subscriber::registry().with(filter).with(output))?;
    Ok(())
}

/// One page request issued against a source.
///
/// Labelled by source only; endpoints are caller-supplied and unbounded.
pub(crate) fn record_page_request(source: &'static str) {
    counter!("list_loader_page_requests_total", "source" => source).increment(1);
}

/// One page request that ended in failure
pub(crate) fn record_page_failure(source: &'static str, kind: FailureKind) {
    counter!(
        "list_loader_page_failures_total",
        "source" => source,
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Wall time of a page fetch, successful or not
pub(crate) fn record_fetch_duration(source: &'static str, elapsed: std::time::Duration) {
    histogram!("list_loader_page_fetch_duration_ms", "source" => source)
        .record(elapsed.as_secs_f64() * 1_000.0);
}

/// A result that arrived for a session that had already been replaced
pub(crate) fn record_stale_result(source: &'static str) {
    counter!("list_loader_stale_results_total", "source" => source).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let config = AppConfig {
            log_level: "warn".to_string(),
            ..AppConfig::default()
        };
        init_tracing(&config).unwrap();
        init_tracing(&config).unwrap();
        assert!(TELEMETRY_INITIALIZED.load(Ordering::SeqCst));
    }
}
