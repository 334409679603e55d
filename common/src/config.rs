use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::NetworkId;

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application settings.
///
/// Baked in at compile time from `POAP_*` environment variables; the browser
/// front end may override the API URL at runtime (`?api=`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    /// Network new events are created on.
    pub network: NetworkId,
    pub xumm_api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            network: NetworkId::Testnet,
            xumm_api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            option_env!("POAP_API_URL"),
            option_env!("POAP_NETWORK"),
            option_env!("POAP_XUMM_API_KEY"),
            option_env!("POAP_REQUEST_TIMEOUT_SECS"),
        )
    }

    /// Build from raw values; empty or unparsable values fall back to
    /// defaults.
    pub fn from_values(
        api_url: Option<&str>,
        network: Option<&str>,
        xumm_api_key: Option<&str>,
        request_timeout_secs: Option<&str>,
    ) -> Self {
        fn non_empty(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let defaults = Self::default();

        let network = match non_empty(network).map(NetworkId::from_name) {
            Some(NetworkId::Unknown) => {
                tracing::warn!("unrecognized POAP_NETWORK, using {}", defaults.network);
                defaults.network
            }
            Some(network) => network,
            None => defaults.network,
        };

        Self {
            api_url: non_empty(api_url)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            network,
            xumm_api_key: non_empty(xumm_api_key).map(String::from),
            request_timeout_secs: non_empty(request_timeout_secs)
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
