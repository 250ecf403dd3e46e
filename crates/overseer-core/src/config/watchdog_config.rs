use serde::{Deserialize, Serialize};

use super::defaults;

/// Stream scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Load the built-in rule set before custom rules.
    pub use_default_rules: bool,
    /// Lines longer than this are truncated before matching.
    pub max_line_bytes: usize,
    /// Extra `(regex, error_type)` rules appended after the defaults.
    pub extra_rules: Vec<(String, String)>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            use_default_rules: true,
            max_line_bytes: defaults::DEFAULT_MAX_LINE_BYTES,
            extra_rules: Vec::new(),
        }
    }
}
