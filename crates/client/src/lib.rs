//! Client code for wxcache.
//!
//! This crate provides the HTTP fetch collaborator the forecast cache calls
//! on a miss, plus the parser that turns a raw forecast document into
//! structured fields.

pub mod fetch;
pub mod parse;
pub mod sources;

pub use fetch::{FetchClient, FetchConfig};
pub use parse::{ParsedForecast, PeriodForecast, parse_forecast};
pub use sources::{ForecastFetcher, source_url};
