//! Forecast product and location identifiers.
//!
//! These are the only two dimensions (besides the date) that address a
//! cache bucket, and the only inputs the fetch collaborator needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A forecast product published by some upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastSource {
    /// Mount Rainier recreational forecast (UW Atmospheric Sciences mirror of the NWS product).
    MoraRecFcst,
}

/// A place a forecast product covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    /// Mount Rainier National Park.
    Mora,
}

impl ForecastSource {
    pub const ALL: &'static [ForecastSource] = &[ForecastSource::MoraRecFcst];

    /// Name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ForecastSource::MoraRecFcst => "MORA_REC_FCST",
        }
    }

    /// Path component used for this source's cache buckets.
    pub fn dir_name(&self) -> String {
        self.name().to_lowercase()
    }
}

impl Location {
    pub const ALL: &'static [Location] = &[Location::Mora];

    /// Name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Location::Mora => "MORA",
        }
    }

    /// Path component used for this location's cache buckets.
    pub fn dir_name(&self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForecastSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown forecast source: {s}")))
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|location| location.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown forecast location: {s}")))
    }
}
