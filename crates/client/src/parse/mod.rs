//! Structured fields from raw forecast documents.
//!
//! One parser per [`ForecastSource`], selected by [`parse_forecast`].
//! Parsing never fails outright: sections that cannot be found are logged
//! and recorded in [`ParsedForecast::notes`].

mod mora;

use std::fmt;

use serde::Serialize;
use wxcache_core::{ForecastSource, Location};

/// One labelled block of a forecast, e.g. `TONIGHT` or `SATURDAY NIGHT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodForecast {
    pub label: String,
    pub text: String,
}

/// Fields extracted from a forecast document.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedForecast {
    pub source: ForecastSource,
    pub location: Location,
    /// Product title as printed by the publisher.
    pub source_text: Option<String>,
    /// Issue time exactly as printed; not normalized.
    pub time_issued: Option<String>,
    pub synopsis: Option<String>,
    /// Near-term period forecasts.
    pub periods: Vec<PeriodForecast>,
    /// Extended-range period forecasts.
    pub extended: Vec<PeriodForecast>,
    /// Problems met while parsing.
    pub notes: Vec<String>,
}

impl ParsedForecast {
    fn empty(source: ForecastSource, location: Location) -> Self {
        Self {
            source,
            location,
            source_text: None,
            time_issued: None,
            synopsis: None,
            periods: Vec::new(),
            extended: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn note(&mut self, message: &str) {
        tracing::warn!(source = %self.source, "{message}");
        self.notes.push(message.to_string());
    }
}

impl fmt::Display for ParsedForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.location)?;
        writeln!(f, "{} ({})", self.source_text.as_deref().unwrap_or(""), self.source)?;
        writeln!(f, "{}", self.time_issued.as_deref().unwrap_or(""))?;
        writeln!(f, "{}", self.synopsis.as_deref().unwrap_or(""))?;
        for period in self.periods.iter().chain(&self.extended) {
            writeln!(f, "{}: {}", period.label, period.text)?;
        }
        Ok(())
    }
}

/// Parse `text` as a document published by `source`.
pub fn parse_forecast(source: ForecastSource, location: Location, text: &str) -> ParsedForecast {
    let mut parsed = ParsedForecast::empty(source, location);
    match source {
        ForecastSource::MoraRecFcst => mora::parse_into(&mut parsed, text),
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_identifiers_by_name() {
        let parsed = ParsedForecast::empty(ForecastSource::MoraRecFcst, Location::Mora);
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["source"], "MORA_REC_FCST");
        assert_eq!(json["location"], "MORA");
        assert!(json["synopsis"].is_null());
    }

    #[test]
    fn test_display_lists_periods() {
        let mut parsed = ParsedForecast::empty(ForecastSource::MoraRecFcst, Location::Mora);
        parsed.synopsis = Some("Dry.".into());
        parsed.periods.push(PeriodForecast { label: "TODAY".into(), text: "Sunny.".into() });
        let text = parsed.to_string();
        assert!(text.starts_with("MORA\n"));
        assert!(text.contains("(MORA_REC_FCST)"));
        assert!(text.contains("TODAY: Sunny."));
    }
}
