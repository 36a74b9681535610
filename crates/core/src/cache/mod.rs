//! Day-bucketed, content-addressed file cache for forecast documents.
//!
//! Layout on disk:
//!
//! ```text
//! <base>/<source>/<location>/<YYYYMM>/<YYYYMMDD>.<index>.txt
//! ```
//!
//! - Index 0 is reserved for a carry-over link to yesterday's entry
//! - Primary entries start at index 1 and are never rewritten or deleted
//! - At most one primary per distinct document per day (SHA-256 dedup)

pub mod entry;
pub mod hash;
pub mod lookup;
pub mod paths;
pub mod store;

pub use crate::Error;

pub use entry::{CacheEntry, EntryKind};
pub use lookup::{CacheTimeout, FreshEntry};
pub use paths::DateStamp;
pub use store::{CacheConfig, CachedForecast, FetchOptions, ForecastCache, Origin, PersistOutcome};
