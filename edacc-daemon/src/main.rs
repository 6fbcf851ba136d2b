use anyhow::Result;
use clap::Parser;

use edacc_daemon::assistant::{Assistant, load_config};
use edacc_daemon::cli::DaemonCli;
use edacc_daemon::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    let config = load_config(&cli).await?;

    if cli.validate {
        println!(
            "configuration is valid (journal: {}, targets: {})",
            config.journal.dir,
            config.mining.target_materials.len()
        );
        return Ok(());
    }

    init_tracing(&config.general)?;
    edacc_core::metrics::describe_all();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edacc starting");

    let mut assistant = Assistant::build_from_config(config)?;
    assistant.run().await
}
