//! Store configuration.
//!
//! The shared store is named by environment at deploy time. When either
//! variable is missing the tracker still works, it just stays local.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable naming the shared store location.
pub const ENV_DB_URL: &str = "CAGELOCKE_DB_URL";
/// Environment variable carrying the shared store access key.
pub const ENV_DB_KEY: &str = "CAGELOCKE_DB_KEY";

/// Connection settings for the shared store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Where the shared store lives.
    pub url: String,
    /// Access key presented on connect.
    pub key: String,
}

impl StoreConfig {
    /// Create a configuration from explicit values.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// Missing variables are logged and left empty rather than failing,
    /// so a build without them degrades to local-only mode.
    pub fn from_env() -> Self {
        Self {
            url: env_or_warn(ENV_DB_URL),
            key: env_or_warn(ENV_DB_KEY),
        }
    }

    /// Whether both settings are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.key.trim().is_empty()
    }
}

fn env_or_warn(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => {
            warn!(
                variable = name,
                "missing environment variable; the shared store stays unavailable"
            );
            String::new()
        }
    }
}
