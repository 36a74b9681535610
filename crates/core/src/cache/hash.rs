//! Content hashing for forecast deduplication.
//!
//! The digest only answers "is this the same document?"; it is not a
//! security boundary.

use sha2::{Digest, Sha256};

/// Compute the content hash of a forecast document's raw text.
pub fn hash_forecast(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
