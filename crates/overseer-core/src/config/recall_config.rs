use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::defaults;

/// RecallDB retention and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Time-to-live applied to every record family.
    pub ttl_secs: u64,
    /// Signatures are truncated to this many characters.
    pub signature_max_len: usize,
    /// Window used by repeat-offender checks.
    pub lookback_secs: u64,
    pub query_limit: usize,
    pub top_n: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::DEFAULT_RECORD_TTL_SECS,
            signature_max_len: defaults::DEFAULT_SIGNATURE_MAX_LEN,
            lookback_secs: defaults::DEFAULT_LOOKBACK_SECS,
            query_limit: defaults::DEFAULT_QUERY_LIMIT,
            top_n: defaults::DEFAULT_TOP_N,
        }
    }
}

impl RecallConfig {
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs as i64)
    }

    pub fn lookback(&self) -> Duration {
        Duration::seconds(self.lookback_secs as i64)
    }
}
