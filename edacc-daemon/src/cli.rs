//! CLI argument definitions for the `edacc` binary.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use edacc_core::config::EdaccConfig;

/// Configuration file used when `--config` is not given.
///
/// A missing file at this path is created with default values.
pub const DEFAULT_CONFIG_PATH: &str = "edacc.toml";

/// Elite Dangerous voice assistant.
///
/// Tails the game journal, announces valuable asteroids and incoming
/// messages, and records prospecting results to CSV.
#[derive(Parser, Debug)]
#[command(name = "edacc")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to edacc.toml configuration file.
    ///
    /// When omitted, `edacc.toml` in the working directory is used and
    /// created with defaults if it does not exist.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the journal directory.
    #[arg(long)]
    pub journal_dir: Option<String>,

    /// Override the speech backend (command, log).
    #[arg(long)]
    pub speech_backend: Option<String>,

    /// Validate configuration file and exit without starting the assistant.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut EdaccConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(dir) = &self.journal_dir {
            config.journal.dir.clone_from(dir);
        }
        if let Some(backend) = &self.speech_backend {
            config.speech.backend.clone_from(backend);
        }
    }
}
