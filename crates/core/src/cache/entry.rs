//! Cache entries and bucket listing.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use super::hash::hash_forecast;
use super::paths::{DateStamp, parse_entry_index};
use crate::Error;

/// Whether an entry owns its bytes or borrows them from the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file holding a fetched document.
    Primary,
    /// A symbolic link into the previous day's bucket.
    ///
    /// This is a weak reference: removing the file it points at leaves the
    /// link dangling, and readers will then skip it with a warning.
    CarryOver,
}

/// One stored forecast document, identified by `(date, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub date: DateStamp,
    pub index: u32,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl CacheEntry {
    pub fn is_carry_over(&self) -> bool {
        self.kind == EntryKind::CarryOver
    }

    /// Read the entry's document, following a carry-over link if needed.
    pub async fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path).await
    }

    /// Where a carry-over link points, as stored in the link.
    pub async fn link_target(&self) -> Option<PathBuf> {
        if !self.is_carry_over() {
            return None;
        }
        fs::read_link(&self.path).await.ok()
    }
}

/// List the entries for `date` in `bucket`, ordered by index.
///
/// A missing bucket is simply empty. Files whose names do not follow the
/// `YYYYMMDD.<index>.txt` pattern for `date` are ignored.
pub async fn list_entries(bucket: &Path, date: &DateStamp) -> Result<Vec<CacheEntry>, Error> {
    let mut dir = match fs::read_dir(bucket).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    while let Some(dir_entry) = dir.next_entry().await? {
        let file_name = dir_entry.file_name();
        let Some(index) = file_name.to_str().and_then(|name| parse_entry_index(name, date)) else {
            continue;
        };

        // DirEntry::file_type does not follow links.
        let path = dir_entry.path();
        let Some(kind) = classify(dir_entry.file_type().await, &path) else {
            continue;
        };

        entries.push(CacheEntry { date: date.clone(), index, path, kind });
    }

    entries.sort_by_key(|entry| entry.index);
    Ok(entries)
}

/// Entry kind for a directory entry's (unfollowed) file type.
///
/// An entry that vanished or cannot be stat'ed is logged and skipped so
/// the rest of the bucket is still listed.
fn classify(file_type: io::Result<std::fs::FileType>, path: &Path) -> Option<EntryKind> {
    match file_type {
        Ok(file_type) if file_type.is_symlink() => Some(EntryKind::CarryOver),
        Ok(file_type) if file_type.is_file() => Some(EntryKind::Primary),
        Ok(_) => {
            tracing::debug!(path = %path.display(), "skipping non-file cache entry");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping cache entry that cannot be stat'ed");
            None
        }
    }
}

/// First entry whose content hashes to `hash`.
///
/// Unreadable entries are logged and skipped; they never abort the search.
pub async fn find_by_hash<'a>(entries: &'a [CacheEntry], hash: &str) -> Option<&'a CacheEntry> {
    for entry in entries {
        match entry.read().await {
            Ok(content) if hash_forecast(&content) == hash => return Some(entry),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "skipping unreadable cache entry");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> DateStamp {
        DateStamp::parse("20240315").unwrap()
    }

    #[tokio::test]
    async fn test_list_missing_bucket_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let entries = list_entries(&temp_dir.path().join("nope"), &date()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let temp_dir = TempDir::new().unwrap();
        let bucket = temp_dir.path();
        for name in ["20240315.2.txt", "20240315.1.txt", "20240314.1.txt", "notes.txt", "20240315.a.txt"] {
            std::fs::write(bucket.join(name), name).unwrap();
        }
        std::fs::create_dir(bucket.join("20240315.3.txt")).unwrap();

        let entries = list_entries(bucket, &date()).await.unwrap();
        let indices: Vec<u32> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(entries.iter().all(|e| e.kind == EntryKind::Primary));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_detects_carry_over_link() {
        let temp_dir = TempDir::new().unwrap();
        let bucket = temp_dir.path();
        std::fs::write(bucket.join("20240314.1.txt"), "X").unwrap();
        std::os::unix::fs::symlink("20240314.1.txt", bucket.join("20240315.0.txt")).unwrap();

        let entries = list_entries(bucket, &date()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_carry_over());
        assert_eq!(entries[0].read().await.unwrap(), "X");
        assert_eq!(entries[0].link_target().await, Some(PathBuf::from("20240314.1.txt")));
    }

    #[test]
    fn test_classify_skips_entry_that_cannot_be_stated() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("20240315.1.txt");
        std::fs::write(&file, "A").unwrap();

        let file_type = std::fs::symlink_metadata(&file).map(|m| m.file_type());
        assert_eq!(classify(file_type, &file), Some(EntryKind::Primary));

        let vanished = Err(io::Error::new(io::ErrorKind::NotFound, "removed after readdir"));
        assert_eq!(classify(vanished, &temp_dir.path().join("20240315.2.txt")), None);

        let dir_type = std::fs::symlink_metadata(temp_dir.path()).map(|m| m.file_type());
        assert_eq!(classify(dir_type, temp_dir.path()), None);
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let temp_dir = TempDir::new().unwrap();
        let bucket = temp_dir.path();
        std::fs::write(bucket.join("20240315.1.txt"), "first").unwrap();
        std::fs::write(bucket.join("20240315.2.txt"), "second").unwrap();

        let entries = list_entries(bucket, &date()).await.unwrap();
        let found = find_by_hash(&entries, &hash_forecast("second")).await.unwrap();
        assert_eq!(found.index, 2);
        assert!(find_by_hash(&entries, &hash_forecast("third")).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_by_hash_skips_dangling_link() {
        let temp_dir = TempDir::new().unwrap();
        let bucket = temp_dir.path();
        std::os::unix::fs::symlink("gone.txt", bucket.join("20240315.0.txt")).unwrap();
        std::fs::write(bucket.join("20240315.1.txt"), "kept").unwrap();

        let entries = list_entries(bucket, &date()).await.unwrap();
        assert_eq!(entries.len(), 2);
        let found = find_by_hash(&entries, &hash_forecast("kept")).await.unwrap();
        assert_eq!(found.index, 1);
    }
}
