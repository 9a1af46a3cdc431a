//! Free-text to coordinates resolution.
//!
//! A [`GeocodingPipeline`] pulls a place name out of a disaster description
//! with a [`PlaceExtractor`], then asks a [`GeocodingService`] for its
//! coordinates. Both collaborators are trait objects so tests and decorators
//! (caching, rate limiting) can be slotted in without touching the pipeline.
//!
//! Production wiring uses [`HeuristicPlaceExtractor`] and
//! [`NominatimClient`].

mod config;
mod extract;
mod nominatim;
mod pipeline;

pub use config::GeocoderConfig;
pub use extract::{fallback_candidate, HeuristicPlaceExtractor, PlaceExtractor};
pub use nominatim::{GeocodingService, NominatimClient};
pub use pipeline::GeocodingPipeline;

use serde::Serialize;
use thiserror::Error;

/// A place name together with the coordinates it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Errors produced by the geocoding pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeError {
    /// Neither the extractor nor the fallback pattern found a place name.
    #[error("Could not extract a location name from the text.")]
    NoLocationExtracted,

    /// The geocoding service returned no match for the candidate.
    #[error("Could not find coordinates for \"{0}\"")]
    LocationNotResolvable(String),

    /// The geocoding service did not answer within the configured bound.
    #[error("geocoding service timed out")]
    Timeout,

    /// Transport, status, or decoding failure talking to the service.
    #[error("geocoding service error: {0}")]
    Upstream(String),
}

impl GeocodeError {
    /// Whether the failure is about the input text rather than the service.
    pub fn is_unresolvable(&self) -> bool {
        matches!(
            self,
            Self::NoLocationExtracted | Self::LocationNotResolvable(_)
        )
    }
}
