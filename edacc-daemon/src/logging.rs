//! Logging initialization for the `edacc` binary.
//!
//! Installs a `tracing-subscriber` registry configured from the
//! `[general]` section of `EdaccConfig`.

use anyhow::{Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use edacc_core::config::GeneralConfig;

/// Build the level filter.
///
/// `RUST_LOG` wins when it is set and parses; otherwise `log_level` is used.
pub fn build_filter(log_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level)
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", log_level, e))
}

/// Initialize the global tracing subscriber.
///
/// Must be called once, before the pipeline starts. `json` emits one JSON
/// object per line; `pretty` is multi-line and shows thread names so the
/// announcement worker is easy to tell apart.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(&config.log_level)?);

    let installed = match config.log_format.as_str() {
        "json" => registry.with(fmt::layer().json()).try_init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_thread_names(true))
            .try_init(),
        other => bail!("unknown log format '{}', expected 'json' or 'pretty'", other),
    };

    installed.map_err(|e| {
        anyhow::anyhow!(
            "failed to initialize {} tracing subscriber: {}",
            config.log_format,
            e
        )
    })
}
