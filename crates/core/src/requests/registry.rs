//! Append-only log of forecast requests that have already been answered.
//!
//! One line per request: `hash\tuid\temail\tYYYYMMDD HH:MM:SS`. Only the
//! first column is read back; the rest is for humans.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::ForecastRequest;
use crate::Error;

/// The set of answered request hashes, backed by a file on disk.
#[derive(Debug)]
pub struct RequestRegistry {
    path: PathBuf,
    hashes: HashSet<String>,
}

impl RequestRegistry {
    /// Read every hash recorded in `path`.
    ///
    /// A missing file is an empty registry; it is created on the first
    /// `add_entry`.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(registry_error(&path, &e)),
        };

        let mut hashes = HashSet::new();
        for hash in text.lines().filter_map(|line| line.split_whitespace().next()) {
            tracing::debug!(hash, "read hash from request registry");
            hashes.insert(hash.to_string());
        }

        Ok(Self { path, hashes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Whether `request` has already been answered.
    pub fn check(&self, request: &ForecastRequest) -> bool {
        self.hashes.contains(&request.get_hash())
    }

    /// Record `request` as answered.
    ///
    /// Returns `false` without touching the file when it is already
    /// registered.
    pub async fn add_entry(&mut self, request: &ForecastRequest) -> Result<bool, Error> {
        let hash = request.get_hash();
        if self.hashes.contains(&hash) {
            return Ok(false);
        }

        let line = format!("{}\n", request.registry_line());
        append(&self.path, &line).await.map_err(|e| registry_error(&self.path, &e))?;

        self.hashes.insert(hash);
        Ok(true)
    }
}

async fn append(path: &Path, line: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().append(true).create(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

fn registry_error(path: &Path, e: &io::Error) -> Error {
    Error::Registry(format!("{}: {e}", path.display()))
}
