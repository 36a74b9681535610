//! Bucket addressing for the forecast cache.
//!
//! Layout: `base/<source>/<location>/<YYYYMM>/<YYYYMMDD>.<index>.txt`.
//! Every function here is pure; none of them touch the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::Error;
use crate::forecast::{ForecastSource, Location};

/// Index reserved for a carry-over link.
pub const CARRY_OVER_INDEX: u32 = 0;

/// Index claimed by the first primary entry of a bucket.
pub const FIRST_PRIMARY_INDEX: u32 = 1;

const DATE_FORMAT: &str = "%Y%m%d";

/// A calendar day in the reference timezone, rendered as `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DateStamp(String);

impl DateStamp {
    /// The day `delta_days` away from the day containing `now` in `tz`.
    ///
    /// The caller's local timezone never enters into this, so every process
    /// sharing a cache directory buckets a given instant identically.
    pub fn for_day(now: DateTime<Utc>, tz: Tz, delta_days: i64) -> Self {
        let date = now.with_timezone(&tz).date_naive() + TimeDelta::days(delta_days);
        Self(date.format(DATE_FORMAT).to_string())
    }

    /// Parse a `YYYYMMDD` string, rejecting anything that is not a real date.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!("expected YYYYMMDD, got {s:?}")));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|e| Error::InvalidInput(format!("invalid date {s}: {e}")))?;
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYYYMM` directory this day's entries live in.
    pub fn month_dir(&self) -> &str {
        &self.0[..6]
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Today's date in the reference timezone.
pub fn today(tz: Tz, now: DateTime<Utc>) -> DateStamp {
    DateStamp::for_day(now, tz, 0)
}

/// Yesterday's date in the reference timezone.
pub fn yesterday(tz: Tz, now: DateTime<Utc>) -> DateStamp {
    DateStamp::for_day(now, tz, -1)
}

/// Directory holding every entry for `(source, location, date)`.
pub fn bucket_path(base: &Path, source: ForecastSource, location: Location, date: &DateStamp) -> PathBuf {
    base.join(source.dir_name())
        .join(location.dir_name())
        .join(date.month_dir())
}

/// File name of the entry at `index` for `date`.
pub fn entry_file_name(date: &DateStamp, index: u32) -> String {
    format!("{date}.{index}.txt")
}

/// Full path of the entry at `index` within `bucket`.
pub fn entry_path(bucket: &Path, date: &DateStamp, index: u32) -> PathBuf {
    bucket.join(entry_file_name(date, index))
}

/// Index encoded in an entry file name, if the name belongs to `date`.
pub fn parse_entry_index(file_name: &str, date: &DateStamp) -> Option<u32> {
    let index = file_name
        .strip_prefix(date.as_str())?
        .strip_prefix('.')?
        .strip_suffix(".txt")?;

    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok()
}

/// Relative target for a link placed in `link_dir` pointing at `target`.
///
/// Buckets are sibling `YYYYMM` directories, so the target is either a bare
/// file name or `../<YYYYMM>/<file>`.
pub fn link_target(link_dir: &Path, target: &Path) -> PathBuf {
    let file_name = target.file_name().map(PathBuf::from).unwrap_or_default();

    match target.parent() {
        Some(parent) if parent == link_dir => file_name,
        Some(parent) => match parent.file_name() {
            Some(month) => Path::new("..").join(month).join(file_name),
            None => target.to_path_buf(),
        },
        None => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_today_uses_reference_timezone() {
        // 03:00 UTC on the 16th is still the evening of the 15th in Seattle.
        let now = utc(2024, 3, 16, 3);
        assert_eq!(today(chrono_tz::US::Pacific, now).as_str(), "20240315");
        assert_eq!(today(chrono_tz::UTC, now).as_str(), "20240316");
    }

    #[test]
    fn test_yesterday_crosses_month_and_year() {
        let now = utc(2024, 1, 1, 20);
        assert_eq!(yesterday(chrono_tz::US::Pacific, now).as_str(), "20231231");
        assert_eq!(yesterday(chrono_tz::US::Pacific, now).month_dir(), "202312");
    }

    #[test]
    fn test_date_stamp_parse() {
        assert_eq!(DateStamp::parse("20240229").unwrap().as_str(), "20240229");
        assert!(DateStamp::parse("20230229").is_err());
        assert!(DateStamp::parse("2024-03-01").is_err());
        assert!(DateStamp::parse("202403").is_err());
    }

    #[test]
    fn test_bucket_path() {
        let date = DateStamp::parse("20240315").unwrap();
        let bucket = bucket_path(Path::new("/cache"), ForecastSource::MoraRecFcst, Location::Mora, &date);
        assert_eq!(bucket, PathBuf::from("/cache/mora_rec_fcst/mora/202403"));
        assert_eq!(
            entry_path(&bucket, &date, 2),
            PathBuf::from("/cache/mora_rec_fcst/mora/202403/20240315.2.txt")
        );
    }

    #[test]
    fn test_parse_entry_index() {
        let date = DateStamp::parse("20240315").unwrap();
        assert_eq!(parse_entry_index("20240315.0.txt", &date), Some(0));
        assert_eq!(parse_entry_index("20240315.12.txt", &date), Some(12));
        assert_eq!(parse_entry_index("20240314.1.txt", &date), None);
        assert_eq!(parse_entry_index("20240315.x.txt", &date), None);
        assert_eq!(parse_entry_index("20240315.+1.txt", &date), None);
        assert_eq!(parse_entry_index("20240315..txt", &date), None);
        assert_eq!(parse_entry_index("20240315.1.txt.tmp", &date), None);
    }

    #[test]
    fn test_link_target_same_month() {
        let bucket = Path::new("/cache/src/loc/202403");
        let target = bucket.join("20240314.1.txt");
        assert_eq!(link_target(bucket, &target), PathBuf::from("20240314.1.txt"));
    }

    #[test]
    fn test_link_target_previous_month() {
        let bucket = Path::new("/cache/src/loc/202404");
        let target = Path::new("/cache/src/loc/202403/20240331.2.txt");
        assert_eq!(link_target(bucket, target), PathBuf::from("../202403/20240331.2.txt"));
    }
}
