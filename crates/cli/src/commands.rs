//! Subcommand implementations.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use wxcache_client::{FetchClient, FetchConfig, ForecastFetcher, parse_forecast};
use wxcache_core::cache::{CacheEntry, DateStamp, EntryKind};
use wxcache_core::{AppConfig, CacheTimeout, FetchOptions, ForecastCache, Origin, PersistOutcome, RequestRegistry};

use crate::args::Command;

pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let cache = ForecastCache::new(config.cache_config()?);

    match command {
        Command::Fetch { target, use_cache, timeout, no_save, print } => {
            let options = FetchOptions { use_cache, timeout: resolve_timeout(&cache, timeout)?, persist: !no_save };
            let fetcher = build_fetcher(config)?;

            let forecast = cache
                .get_or_fetch(&fetcher, target.source, target.location, options)
                .await?;
            report(&forecast.origin);

            if print {
                println!("{}", forecast.content);
            }
        }
        Command::Show { target, timeout } => {
            let timeout = resolve_timeout(&cache, timeout)?;
            let Some(hit) = cache.find_fresh(target.source, target.location, timeout).await? else {
                bail!("no fresh entry for {}/{}", target.source, target.location);
            };
            println!("{}", hit.content);
        }
        Command::Parse { target, timeout, json } => {
            let options = FetchOptions { timeout: resolve_timeout(&cache, timeout)?, ..cache.default_options() };
            let fetcher = build_fetcher(config)?;

            let forecast = cache
                .get_or_fetch(&fetcher, target.source, target.location, options)
                .await?;
            report(&forecast.origin);

            let parsed = parse_forecast(target.source, target.location, &forecast.content);
            if json {
                println!("{}", serde_json::to_string_pretty(&parsed).context("serializing parsed forecast")?);
            } else {
                print!("{parsed}");
            }
        }
        Command::Ls { target, date } => {
            let date = match date {
                Some(date) => DateStamp::parse(&date)?,
                None => cache.today(Utc::now()),
            };

            let entries = cache.list_bucket(target.source, target.location, &date).await?;
            if entries.is_empty() {
                tracing::info!(%date, "no cache entries");
            }
            for entry in &entries {
                println!("{}", describe_entry(entry).await);
            }
        }
        Command::Requests { registry } => {
            let path = registry.unwrap_or_else(|| config.registry_path.clone());
            let registry = RequestRegistry::load(path).await?;
            println!("{}\t{}", registry.len(), registry.path().display());
        }
    }

    Ok(())
}

fn resolve_timeout(cache: &ForecastCache, secs: Option<i64>) -> Result<CacheTimeout> {
    match secs {
        Some(secs) => CacheTimeout::from_secs(secs)
            .ok_or_else(|| anyhow!("--timeout must be -1 (unbounded) or a non-negative number of seconds")),
        None => Ok(cache.config().default_timeout),
    }
}

fn build_fetcher(config: &AppConfig) -> Result<ForecastFetcher> {
    let client = FetchClient::new(FetchConfig::from(config))?;
    Ok(ForecastFetcher::new(client))
}

fn report(origin: &Origin) {
    match origin {
        Origin::Cache { path, age } => {
            tracing::info!(path = %path.display(), age_secs = age.as_secs(), "served from cache");
        }
        Origin::Fetched(PersistOutcome::NotPersisted) => tracing::info!("fetched; not saved"),
        Origin::Fetched(PersistOutcome::CarriedOver { link, target }) => {
            tracing::info!(link = %link.display(), target = %target.display(), "unchanged since yesterday; linked");
        }
        Origin::Fetched(PersistOutcome::Duplicate { path }) => {
            tracing::info!(path = %path.display(), "unchanged; already cached");
        }
        Origin::Fetched(PersistOutcome::Stored { path }) => {
            tracing::info!(path = %path.display(), "new forecast cached");
        }
        Origin::Fetched(PersistOutcome::Skipped { path }) => {
            tracing::warn!(path = %path.display(), "served from fetch, not persisted");
        }
    }
}

async fn describe_entry(entry: &CacheEntry) -> String {
    match entry.kind {
        EntryKind::Primary => format!("{}\tprimary\t{}", entry.index, entry.path.display()),
        EntryKind::CarryOver => {
            let target = entry
                .link_target()
                .await
                .map_or_else(|| "?".to_string(), |t| t.display().to_string());
            format!("{}\tcarry_over\t{} -> {}", entry.index, entry.path.display(), target)
        }
    }
}
