//! Default values for every configuration option.

// Controller timeouts (milliseconds unless noted).
pub const DEFAULT_DETECTION_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CLASSIFICATION_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_DB_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_LEDGER_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_OPERATOR_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REMEDIATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_QUEUE_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HEALTH_PROBE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 3;
pub const DEFAULT_ROLLBACK_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_IDLE_DELAY_MS: u64 = 100;
pub const DEFAULT_ERROR_DELAY_MS: u64 = 1_000;
pub const DEFAULT_TASK_COMPLEXITY: f64 = 0.5;
pub const DEFAULT_COST_BUDGET: f64 = 10.0;
pub const DEFAULT_MIN_REMEDIATION_CONFIDENCE: f64 = 0.3;

// Storage
pub const DEFAULT_ROOT_DIR: &str = ".overseer";
pub const DEFAULT_RECALL_DB_FILE: &str = "recall.db";
pub const DEFAULT_CONFIDENCE_DB_FILE: &str = "confidence.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// Recall
pub const DEFAULT_RECORD_TTL_SECS: u64 = 7 * 24 * 3600;
pub const DEFAULT_SIGNATURE_MAX_LEN: usize = 200;
pub const DEFAULT_LOOKBACK_SECS: u64 = 24 * 3600;
pub const DEFAULT_QUERY_LIMIT: usize = 50;
pub const DEFAULT_TOP_N: usize = 10;

// Confidence
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_MAX_HISTORICAL_WEIGHT: f64 = 0.8;
pub const DEFAULT_STRATEGY_ADJUSTMENT_CAP: f64 = 0.2;
pub const DEFAULT_BASELINE_SUCCESS_RATE: f64 = 0.5;
pub const DEFAULT_CALIBRATION_INTERVAL: u64 = 20;
pub const DEFAULT_STRATEGY_WINDOW: usize = 50;
pub const DEFAULT_MIN_STRATEGY_SAMPLES: usize = 5;
pub const DEFAULT_PRIOR_STRENGTH: f64 = 5.0;
pub const DEFAULT_OUTCOME_RETENTION_DAYS: u64 = 180;
pub const DEFAULT_MAX_OUTCOMES_PER_QUERY: usize = 500;

// Watchdog
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
