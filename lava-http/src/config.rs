//! Gateway client configuration.
//!
//! [`GatewayConfig`] is deserializable so it can be embedded in the host
//! application's own configuration file. Loading it from disk or the
//! environment is left to the application.
//!
//! # Example
//!
//! ```rust
//! use lava_http::GatewayConfig;
//!
//! let config: GatewayConfig = serde_json::from_str(r#"{
//!     "secret_key": "9de2257f00f5a8ca54b71197cd3b465e7bdfc8b3",
//!     "timeout_secs": 30
//! }"#).unwrap();
//!
//! assert_eq!(config.base_url.as_str(), "https://api.lava.ru/");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::DEFAULT_BASE_URL;

/// Configuration for [`GatewayClient`](crate::GatewayClient).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Merchant secret key used to sign requests and verify webhooks.
    pub secret_key: String,

    /// Gateway base URL (default: `https://api.lava.ru/`).
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Per-request timeout in seconds. Unset means the transport default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// Creates a config for the default gateway URL.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}
