use anyhow::Result;
use clap::Parser;

use depwatch_core::config::DepwatchConfig;
use depwatch_daemon::cli::DaemonCli;
use depwatch_daemon::logging;
use depwatch_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    let mut config = DepwatchConfig::load(&args.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", args.config.display(), e))?;

    // CLI overrides take precedence over config file and environment
    if let Some(level) = args.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = args.log_format {
        config.general.log_format = format;
    }
    if let Some(pid_file) = args.pid_file {
        config.general.pid_file = pid_file;
    }

    if args.validate {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        println!("configuration OK: {}", args.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "depwatch-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("depwatch-daemon shut down");
    Ok(())
}
