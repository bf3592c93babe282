//! Logging setup for Roam
//!
//! Installs a `tracing-subscriber` registry with an env filter and either a
//! human-readable or a JSON formatter.

use roam_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Guard returned by [`init`]; hold it for the lifetime of the process
pub struct TelemetryGuard {
    format: LogFormat,
}

impl TelemetryGuard {
    /// Format the subscriber was installed with
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("telemetry shut down");
    }
}

/// Initialize logging from configuration
///
/// `RUST_LOG` wins over the configured filter; `default_filter` is used when
/// neither is present or the configured directive does not parse.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<TelemetryGuard> {
    let format = config.map(|c| c.format).unwrap_or_default();
    let filter = build_filter(config.map(|c| c.filter.as_str()), default_filter);

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(TelemetryGuard { format })
}

fn build_filter(configured: Option<&str>, default_filter: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    configured
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(default_filter).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
