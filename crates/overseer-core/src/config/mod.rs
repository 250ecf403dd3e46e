pub mod defaults;

mod confidence_config;
mod controller_config;
mod observability_config;
mod recall_config;
mod storage_config;
mod watchdog_config;

pub use confidence_config::ConfidenceConfig;
pub use controller_config::ControllerConfig;
pub use observability_config::ObservabilityConfig;
pub use recall_config::RecallConfig;
pub use storage_config::StorageConfig;
pub use watchdog_config::WatchdogConfig;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Complete supervisor configuration. Every section falls back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverseerConfig {
    pub controller: ControllerConfig,
    pub storage: StorageConfig,
    pub recall: RecallConfig,
    pub confidence: ConfidenceConfig,
    pub watchdog: WatchdogConfig,
    pub observability: ObservabilityConfig,
}

impl OverseerConfig {
    /// Parse a TOML document. An empty document yields all defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }
}
