//! Where each forecast product is published, and the `Fetcher` built on it.

use wxcache_core::{Error, Fetcher, ForecastSource, Location};

use crate::fetch::FetchClient;

/// UW Atmospheric Sciences mirror of the NWS Mount Rainier recreational forecast.
pub const MORA_REC_FCST_URL: &str = "https://a.atmos.washington.edu/data/rainier_report.html";

/// URL publishing `source` for `location`, if that product covers it.
pub fn source_url(source: ForecastSource, location: Location) -> Option<&'static str> {
    match (source, location) {
        (ForecastSource::MoraRecFcst, Location::Mora) => Some(MORA_REC_FCST_URL),
    }
}

/// Fetches raw forecast documents over HTTP.
pub struct ForecastFetcher {
    client: FetchClient,
}

impl ForecastFetcher {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Fetcher for ForecastFetcher {
    async fn fetch_raw(&self, source: ForecastSource, location: Location) -> Result<String, Error> {
        let url = source_url(source, location).ok_or_else(|| Error::UnsupportedRoute {
            source_name: source.name().to_string(),
            location: location.name().to_string(),
        })?;

        tracing::debug!(%source, %location, url, "fetching raw forecast");
        self.client.fetch_text(url).await
    }
}
