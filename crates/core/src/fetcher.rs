//! The seam between the cache and whatever retrieves raw forecast text.

use crate::Error;
use crate::forecast::{ForecastSource, Location};

/// Retrieves the raw text of a forecast document.
///
/// The cache calls this on a miss and never inspects or suppresses the
/// error; it reaches the caller of `get_or_fetch` unchanged.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_raw(&self, source: ForecastSource, location: Location) -> Result<String, Error>;
}
