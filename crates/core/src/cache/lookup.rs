//! Freshness lookup: the cache read path.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs;

use super::entry::{CacheEntry, list_entries};
use super::paths::DateStamp;
use crate::Error;

/// How old a cached entry may be and still be served instead of fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTimeout {
    /// Entries strictly younger than this are fresh.
    Within(Duration),
    /// Any entry from today is fresh.
    Unbounded,
}

impl CacheTimeout {
    /// Seconds sentinel meaning "no limit".
    pub const UNBOUNDED_SECS: i64 = -1;

    /// Interpret a seconds value, where `-1` means unbounded.
    ///
    /// Returns `None` for any other negative value.
    pub fn from_secs(secs: i64) -> Option<Self> {
        match secs {
            Self::UNBOUNDED_SECS => Some(Self::Unbounded),
            s if s >= 0 => Some(Self::Within(Duration::from_secs(s.unsigned_abs()))),
            _ => None,
        }
    }

    pub fn admits(&self, age: Duration) -> bool {
        match self {
            Self::Within(limit) => age < *limit,
            Self::Unbounded => true,
        }
    }
}

/// A cache hit: the entry served, how old it was, and its content.
#[derive(Debug, Clone)]
pub struct FreshEntry {
    pub entry: CacheEntry,
    pub age: Duration,
    pub content: String,
}

/// Find the youngest entry for `date` in `bucket` that `timeout` admits.
///
/// Entries with a timestamp after `now` are anomalies and are never
/// selected. Entries that cannot be stat'ed or read are skipped and the next
/// youngest candidate is tried.
pub async fn find_fresh(
    bucket: &Path, date: &DateStamp, timeout: CacheTimeout, now: DateTime<Utc>,
) -> Result<Option<FreshEntry>, Error> {
    tracing::debug!(bucket = %bucket.display(), %date, "searching forecast cache");

    let mut candidates = Vec::new();
    for entry in list_entries(bucket, date).await? {
        let Some(age) = entry_age(&entry, now).await else {
            continue;
        };
        if timeout.admits(age) {
            candidates.push((age, entry));
        }
    }
    candidates.sort_by_key(|(age, _)| *age);

    for (age, entry) in candidates {
        match entry.read().await {
            Ok(content) => {
                tracing::info!(age_secs = age.as_secs(), path = %entry.path.display(), "loading forecast from cache");
                return Ok(Some(FreshEntry { entry, age, content }));
            }
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "skipping unreadable cache entry");
            }
        }
    }

    Ok(None)
}

/// Time elapsed since the entry was written, following carry-over links.
///
/// Entries are read-only once written, so the modification time is the
/// creation time.
async fn entry_age(entry: &CacheEntry, now: DateTime<Utc>) -> Option<Duration> {
    let modified = match fs::metadata(&entry.path).await.and_then(|meta| meta.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified),
        Err(e) => {
            tracing::warn!(path = %entry.path.display(), error = %e, "skipping cache entry without a timestamp");
            return None;
        }
    };

    match now.signed_duration_since(modified).to_std() {
        Ok(age) => Some(age),
        Err(_) => {
            tracing::warn!(
                path = %entry.path.display(),
                cached_at = %modified.to_rfc3339(),
                "cached file has a creation timestamp in the future"
            );
            None
        }
    }
}
