use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use nomad_client::config::{Args, Config};
use nomad_client::log::{install_panic_hook, setup_logger};
use nomad_client::source::{nomad::NomadSource, DataSource};
use nomad_client::ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Arc::new(Config::load(args)?);

    setup_logger(&config.log_dir)
        .with_context(|| format!("cannot write log file in {}", config.log_dir.display()))?;
    install_panic_hook();
    tracing::info!(address = %config.address, namespace = %config.namespace, "starting");

    let source: Arc<dyn DataSource> = Arc::new(NomadSource::new(config.clone())?);
    ui::run(config, source).await.context("terminal session failed")?;
    Ok(())
}
