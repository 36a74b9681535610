//! Fetch-and-persist: the cache write path.
//!
//! A bucket moves through these states within one day and never back:
//!
//! ```text
//! EMPTY --carry-over--> HAS_LINK --new content--> HAS_LINK + PRIMARY x N
//! EMPTY --new content-> HAS_PRIMARY --new content--> HAS_PRIMARY x N
//! ```
//!
//! There is no internal locking. Callers must not run two fetch cycles for
//! the same `(source, location)` at once; if they do, the second writer to a
//! path loses with a logged error rather than clobbering the first.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::entry::{CacheEntry, find_by_hash, list_entries};
use super::hash::hash_forecast;
use super::lookup::{self, CacheTimeout, FreshEntry};
use super::paths::{CARRY_OVER_INDEX, DateStamp, FIRST_PRIMARY_INDEX, bucket_path, entry_path, link_target};
use crate::Error;
use crate::fetcher::Fetcher;
use crate::forecast::{ForecastSource, Location};

/// Everything the cache needs to know about its environment.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory of the cache tree.
    pub base_dir: PathBuf,
    /// Timezone that decides which day bucket an instant falls in.
    pub timezone: Tz,
    /// Freshness window used when a caller does not choose one.
    pub default_timeout: CacheTimeout,
}

/// Per-call knobs for [`ForecastCache::get_or_fetch`].
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Serve a fresh cached entry instead of fetching when one exists.
    pub use_cache: bool,
    /// How old a cached entry may be and still count as fresh.
    pub timeout: CacheTimeout,
    /// Store newly fetched content.
    pub persist: bool,
}

/// What happened to freshly fetched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Persistence was turned off for this call.
    NotPersisted,
    /// Content matched yesterday's; a link was placed at index 0.
    CarriedOver { link: PathBuf, target: PathBuf },
    /// Content matched an entry already in today's bucket.
    Duplicate { path: PathBuf },
    /// Content was written as a new primary entry.
    Stored { path: PathBuf },
    /// The target path already existed, so nothing was written.
    Skipped { path: PathBuf },
}

impl PersistOutcome {
    /// True if the content is now reachable from today's bucket.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::CarriedOver { .. } | Self::Duplicate { .. } | Self::Stored { .. })
    }
}

/// Where the returned content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Cache { path: PathBuf, age: Duration },
    Fetched(PersistOutcome),
}

/// Forecast text plus how it was obtained.
#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub content: String,
    pub origin: Origin,
}

/// Content-addressed, day-bucketed file cache for forecast documents.
#[derive(Debug, Clone)]
pub struct ForecastCache {
    config: CacheConfig,
}

impl ForecastCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Options that read from and write to the cache with the configured timeout.
    pub fn default_options(&self) -> FetchOptions {
        FetchOptions { use_cache: true, timeout: self.config.default_timeout, persist: true }
    }

    /// Today's date in the reference timezone.
    pub fn today(&self, now: DateTime<Utc>) -> DateStamp {
        DateStamp::for_day(now, self.config.timezone, 0)
    }

    pub fn bucket(&self, source: ForecastSource, location: Location, date: &DateStamp) -> PathBuf {
        bucket_path(&self.config.base_dir, source, location, date)
    }

    /// Entries stored for `date`, ordered by index.
    pub async fn list_bucket(
        &self, source: ForecastSource, location: Location, date: &DateStamp,
    ) -> Result<Vec<CacheEntry>, Error> {
        list_entries(&self.bucket(source, location, date), date).await
    }

    /// Youngest entry in today's bucket that `timeout` admits.
    pub async fn find_fresh(
        &self, source: ForecastSource, location: Location, timeout: CacheTimeout,
    ) -> Result<Option<FreshEntry>, Error> {
        self.find_fresh_at(source, location, timeout, Utc::now()).await
    }

    pub async fn find_fresh_at(
        &self, source: ForecastSource, location: Location, timeout: CacheTimeout, now: DateTime<Utc>,
    ) -> Result<Option<FreshEntry>, Error> {
        let today = self.today(now);
        lookup::find_fresh(&self.bucket(source, location, &today), &today, timeout, now).await
    }

    /// Serve a fresh cached forecast, or fetch one and persist it if new.
    ///
    /// Errors from `fetcher` are returned unchanged. A collision on the
    /// target path is not an error: the content is still returned, with
    /// [`PersistOutcome::Skipped`] recording that it was not stored.
    pub async fn get_or_fetch<F: Fetcher + ?Sized>(
        &self, fetcher: &F, source: ForecastSource, location: Location, options: FetchOptions,
    ) -> Result<CachedForecast, Error> {
        self.get_or_fetch_at(fetcher, source, location, options, Utc::now()).await
    }

    pub async fn get_or_fetch_at<F: Fetcher + ?Sized>(
        &self, fetcher: &F, source: ForecastSource, location: Location, options: FetchOptions, now: DateTime<Utc>,
    ) -> Result<CachedForecast, Error> {
        if options.use_cache
            && let Some(hit) = self.find_fresh_at(source, location, options.timeout, now).await?
        {
            return Ok(CachedForecast {
                content: hit.content,
                origin: Origin::Cache { path: hit.entry.path, age: hit.age },
            });
        }

        tracing::debug!(%source, %location, "getting new forecast");
        let content = fetcher.fetch_raw(source, location).await?;

        if !options.persist {
            return Ok(CachedForecast { content, origin: Origin::Fetched(PersistOutcome::NotPersisted) });
        }

        let outcome = self.persist_at(source, location, &content, now).await?;
        Ok(CachedForecast { content, origin: Origin::Fetched(outcome) })
    }

    /// Store `content` in today's bucket unless it is already represented.
    pub async fn persist_at(
        &self, source: ForecastSource, location: Location, content: &str, now: DateTime<Utc>,
    ) -> Result<PersistOutcome, Error> {
        tracing::debug!(%source, %location, "attempting to save forecast");

        let today = self.today(now);
        let bucket = self.bucket(source, location, &today);
        let hash = hash_forecast(content);
        let entries = list_entries(&bucket, &today).await?;

        // Afternoon forecasts routinely survive midnight unchanged; link them
        // forward rather than storing a second copy.
        if entries.is_empty() {
            let yesterday = DateStamp::for_day(now, self.config.timezone, -1);
            let prev_bucket = self.bucket(source, location, &yesterday);
            let prev_entries = list_entries(&prev_bucket, &yesterday).await?;

            if let Some(matched) = find_by_hash(&prev_entries, &hash).await {
                tracing::info!(path = %matched.path.display(), "current forecast matches yesterday's cached forecast");
                return self.carry_over(&bucket, &today, &matched.path).await;
            }
        }

        if let Some(matched) = find_by_hash(&entries, &hash).await {
            tracing::info!(path = %matched.path.display(), "current forecast matches cached forecast");
            return Ok(PersistOutcome::Duplicate { path: matched.path.clone() });
        }

        let index = next_primary_index(&entries, &today);
        let path = entry_path(&bucket, &today, index);
        fs::create_dir_all(&bucket).await?;

        match write_read_only(&path, content).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "writing forecast to cache");
                Ok(PersistOutcome::Stored { path })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::error!(path = %path.display(), "cached file already exists");
                Ok(PersistOutcome::Skipped { path })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn carry_over(&self, bucket: &Path, today: &DateStamp, matched: &Path) -> Result<PersistOutcome, Error> {
        let link = entry_path(bucket, today, CARRY_OVER_INDEX);
        let target = link_target(bucket, matched);
        fs::create_dir_all(bucket).await?;

        match make_link(&target, &link).await {
            Ok(()) => {
                tracing::info!(link = %link.display(), target = %target.display(), "making carry-over link");
                Ok(PersistOutcome::CarriedOver { link, target })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::error!(path = %link.display(), "carry-over link path already exists");
                Ok(PersistOutcome::Skipped { path: link })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Index for the next primary entry.
///
/// Primaries start at 1. A carry-over link occupies index 0, so a bucket
/// holding one link and `n - 1` primaries gets index `n`; without a link,
/// `n` primaries give index `n + 1`.
fn next_primary_index(entries: &[CacheEntry], date: &DateStamp) -> u32 {
    let count = u32::try_from(entries.len()).unwrap_or(u32::MAX - 1);
    let links = entries.iter().filter(|entry| entry.is_carry_over()).count();

    let offset = match links {
        0 => FIRST_PRIMARY_INDEX,
        1 => 0,
        n => {
            tracing::error!(%date, count = n, "more than one carry-over link for date");
            FIRST_PRIMARY_INDEX
        }
    };
    count + offset
}

async fn write_read_only(path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    #[cfg(unix)]
    let perms = {
        use std::os::unix::fs::PermissionsExt;
        std::fs::Permissions::from_mode(0o400)
    };
    #[cfg(not(unix))]
    let perms = {
        let mut perms = fs::metadata(path).await?.permissions();
        perms.set_readonly(true);
        perms
    };
    fs::set_permissions(path, perms).await
}

#[cfg(unix)]
async fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink_file(target, link).await
}
