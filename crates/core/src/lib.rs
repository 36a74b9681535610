//! Core types and shared functionality for wxcache.
//!
//! This crate provides:
//! - The day-bucketed forecast cache
//! - Forecast source and location identifiers
//! - The `Fetcher` seam the cache calls on a miss
//! - The registry of answered mail requests and the `Mailbox` seam
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod requests;

pub use cache::{CacheConfig, CacheTimeout, CachedForecast, FetchOptions, ForecastCache, Origin, PersistOutcome};
pub use config::AppConfig;
pub use error::Error;
pub use fetcher::Fetcher;
pub use forecast::{ForecastSource, Location};
pub use requests::{ForecastRequest, InboxMessage, Mailbox, RequestRegistry};
