//! Assistant assembly and lifecycle management.
//!
//! The [`Assistant`] is the central coordinator of the `edacc` binary.
//! It turns a validated configuration into collaborators (speaker,
//! observation sink), builds the journal pipeline, and runs it until a
//! shutdown signal arrives.
//!
//! # Shutdown Order
//!
//! 1. Ingestion loop (stop reading, final CSV flush)
//! 2. Announcement worker (finish the in-flight call, abandon the rest)

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use edacc_core::config::EdaccConfig;
use edacc_core::metrics as m;
use edacc_core::pipeline::{HealthStatus, Pipeline, Speaker};
use edacc_journal_pipeline::{
    CsvObservationSink, JournalPipeline, JournalPipelineBuilder, PipelineConfig,
    speaker_from_config,
};

use crate::cli::{DEFAULT_CONFIG_PATH, DaemonCli};

/// Interval between periodic health reports.
const HEALTH_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Load the configuration selected by the command line.
///
/// Precedence: CLI flags > `EDACC_*` environment variables > file > defaults.
/// A missing file at the default path is created with default values;
/// a missing file at an explicit `--config` path is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub async fn load_config(cli: &DaemonCli) -> Result<EdaccConfig> {
    let mut config = match &cli.config {
        Some(path) => EdaccConfig::load(path).await,
        None => EdaccConfig::load_or_create(Path::new(DEFAULT_CONFIG_PATH)).await,
    }
    .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;

    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    Ok(config)
}

/// The voice assistant: a journal pipeline plus its collaborators.
pub struct Assistant {
    /// Loaded and validated configuration.
    config: EdaccConfig,
    /// The journal pipeline.
    pipeline: JournalPipeline,
    /// Start time (for uptime reporting).
    start_time: Instant,
}

impl Assistant {
    /// Build from an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the
    /// pipeline cannot be built.
    pub fn build_from_config(config: EdaccConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let speaker = speaker_from_config(&config.speech);
        tracing::info!(
            backend = %config.speech.backend,
            speaker = speaker.name(),
            "speech backend selected"
        );

        let mut builder = JournalPipelineBuilder::new()
            .config(PipelineConfig::from_core(&config))
            .boxed_speaker(speaker);

        if config.storage.enabled {
            tracing::info!(path = %config.storage.path, "mining observations will be recorded");
            builder = builder.sink(CsvObservationSink::new(&config.storage.path));
        } else {
            tracing::info!("observation storage disabled in configuration");
        }

        let pipeline = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build journal pipeline: {}", e))?;

        metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

        Ok(Self {
            config,
            pipeline,
            start_time: Instant::now(),
        })
    }

    /// Start the pipeline and block until a shutdown signal is received.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` and `SIGINT` on unix
    /// - Ctrl+C elsewhere
    pub async fn run(&mut self) -> Result<()> {
        self.pipeline
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start journal pipeline: {}", e))?;

        tracing::info!(
            journal_dir = %self.config.journal.dir,
            "assistant running, press Ctrl+C to stop"
        );

        let shutdown = wait_for_shutdown_signal();
        tokio::pin!(shutdown);

        let mut health_interval = tokio::time::interval(HEALTH_REPORT_INTERVAL);
        health_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // interval fires immediately
        health_interval.tick().await;

        loop {
            tokio::select! {
                signal = &mut shutdown => {
                    let signal = signal?;
                    tracing::info!(signal = signal, "shutdown signal received");
                    break;
                }
                _ = health_interval.tick() => {
                    self.report_health().await;
                }
            }
        }

        self.shutdown().await
    }

    /// Stop the pipeline.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping journal pipeline");
        self.pipeline
            .stop()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop journal pipeline: {}", e))?;
        tracing::info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "assistant shut down"
        );
        Ok(())
    }

    /// Current pipeline health.
    pub async fn health(&self) -> HealthStatus {
        self.pipeline.health_check().await
    }

    async fn report_health(&self) {
        let uptime_secs = self.start_time.elapsed().as_secs();
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);

        let counters = self.pipeline.counters();
        match self.health().await {
            HealthStatus::Healthy => tracing::debug!(
                uptime_secs,
                lines = counters.lines,
                announcements = counters.announcements,
                observations = counters.observations,
                "health check ok"
            ),
            HealthStatus::Degraded(reason) => {
                tracing::warn!(reason = %reason, "assistant degraded");
            }
            HealthStatus::Unhealthy(reason) => {
                tracing::error!(reason = %reason, "assistant unhealthy");
            }
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &EdaccConfig {
        &self.config
    }

    /// Get a reference to the journal pipeline.
    pub fn pipeline(&self) -> &JournalPipeline {
        &self.pipeline
    }
}

/// Wait for a shutdown signal.
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to listen for Ctrl+C: {}", e))?;
    Ok("ctrl-c")
}
