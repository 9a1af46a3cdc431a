//! Geocoding service trait and the OpenStreetMap Nominatim client.

use async_trait::async_trait;
use relief_types::Coordinates;
use serde::Deserialize;
use std::time::Duration;

use crate::{GeocodeError, GeocoderConfig};

/// Resolves a place name to coordinates.
#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Returns at most `limit` matches, best first. An empty list means the
    /// service knows no such place.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Coordinates>, GeocodeError>;
}

/// One hit from the Nominatim search API. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Result<Coordinates, GeocodeError> {
        let parse = |field: &str, value: &str| {
            value.trim().parse::<f64>().map_err(|_| {
                GeocodeError::Upstream(format!("non-numeric {field} in response: {value}"))
            })
        };
        Ok(Coordinates::new(
            parse("lat", &self.lat)?,
            parse("lon", &self.lon)?,
        ))
    }
}

/// HTTP client for a Nominatim-compatible `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    endpoint: String,
}

impl NominatimClient {
    /// Builds a client with the configured user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Upstream`] if the TLS backend cannot be
    /// initialised.
    pub fn from_config(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GeocodingService for NominatimClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Coordinates>, GeocodeError> {
        tracing::debug!(query, limit, endpoint = %self.endpoint, "geocoding search");

        let limit = limit.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout
                } else {
                    GeocodeError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Upstream(format!(
                "geocoder returned HTTP {status}"
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Upstream(format!("invalid geocoder response: {e}")))?;

        places.iter().map(NominatimPlace::coordinates).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let place = NominatimPlace {
            lat: "40.7127281".to_string(),
            lon: "-74.0060152".to_string(),
        };
        let c = place.coordinates().unwrap();
        assert!((c.lat - 40.7127281).abs() < 1e-9);
        assert!((c.lon + 74.0060152).abs() < 1e-9);
    }

    #[test]
    fn rejects_garbage_coordinates() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "0".to_string(),
        };
        assert!(matches!(place.coordinates(), Err(GeocodeError::Upstream(_))));
    }
}
