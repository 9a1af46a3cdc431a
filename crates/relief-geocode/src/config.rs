use serde::{Deserialize, Serialize};

fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    "ReliefCoordination/0.1".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Settings for the outbound geocoding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Full URL of the Nominatim-compatible search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sent on every request. Nominatim rejects anonymous clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound on one search call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}
