use std::sync::Arc;
use std::time::Duration;

use crate::extract::fallback_candidate;
use crate::{GeocodeError, GeocodingService, PlaceExtractor, ResolvedLocation};

/// Extraction followed by a single bounded geocoding call.
///
/// No retries and no caching: one invocation makes at most one outbound
/// request.
#[derive(Clone)]
pub struct GeocodingPipeline {
    extractor: Arc<dyn PlaceExtractor>,
    service: Arc<dyn GeocodingService>,
    timeout: Duration,
}

impl GeocodingPipeline {
    pub fn new(
        extractor: Arc<dyn PlaceExtractor>,
        service: Arc<dyn GeocodingService>,
        timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            service,
            timeout,
        }
    }

    /// The place name that would be sent to the geocoding service.
    ///
    /// First extractor candidate, else the "in <words>" fallback.
    pub fn extract_candidate(&self, text: &str) -> Option<String> {
        self.extractor
            .extract_places(text)
            .into_iter()
            .next()
            .or_else(|| fallback_candidate(text))
    }

    /// Resolves free text to a named location with coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::NoLocationExtracted`] when no candidate is found;
    ///   the service is not called.
    /// - [`GeocodeError::LocationNotResolvable`] when the service has no match.
    /// - [`GeocodeError::Timeout`] when the service exceeds the bound.
    /// - [`GeocodeError::Upstream`] for any other service failure.
    pub async fn resolve_location(&self, text: &str) -> Result<ResolvedLocation, GeocodeError> {
        let candidate = self
            .extract_candidate(text)
            .ok_or(GeocodeError::NoLocationExtracted)?;
        self.resolve_place(&candidate).await
    }

    /// Geocodes an already known place name, skipping extraction.
    ///
    /// A blank name is [`GeocodeError::NoLocationExtracted`]; other errors
    /// are as for [`resolve_location`](Self::resolve_location).
    pub async fn resolve_place(&self, name: &str) -> Result<ResolvedLocation, GeocodeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GeocodeError::NoLocationExtracted);
        }

        let matches = tokio::time::timeout(self.timeout, self.service.search(name, 1))
            .await
            .map_err(|_| GeocodeError::Timeout)??;

        match matches.first() {
            Some(coords) => {
                tracing::debug!(
                    location = %name,
                    lat = coords.lat,
                    lon = coords.lon,
                    "location resolved"
                );
                Ok(ResolvedLocation {
                    location_name: name.to_string(),
                    lat: coords.lat,
                    lon: coords.lon,
                })
            }
            None => Err(GeocodeError::LocationNotResolvable(name.to_string())),
        }
    }
}

impl std::fmt::Debug for GeocodingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingPipeline")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
