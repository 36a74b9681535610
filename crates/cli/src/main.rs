//! wxcache entry point.
//!
//! Fetches forecast documents through the day-bucketed cache.
//! Logging goes to stderr so stdout carries only forecast output.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wxcache_core::AppConfig;

mod args;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = args::Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load()?;
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    tracing::debug!(cache_dir = %config.cache_dir.display(), timezone = %config.timezone, "loaded configuration");

    commands::run(cli.command, &config).await
}
