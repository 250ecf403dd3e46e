//! Health probes for the persisted components.

use std::sync::Arc;

use async_trait::async_trait;

use overseer_confidence::AdaptiveConfidenceEngine;
use overseer_core::errors::{OverseerError, OverseerResult};
use overseer_core::models::ComponentHealth;
use overseer_core::traits::IHealthProbe;
use overseer_recall::RecallDb;

pub struct RecallProbe {
    db: Arc<RecallDb>,
}

impl RecallProbe {
    pub fn new(db: Arc<RecallDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IHealthProbe for RecallProbe {
    fn name(&self) -> &str {
        overseer_recall::db::COMPONENT_NAME
    }

    async fn check(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || db.health())
            .await
            .unwrap_or_else(|e| ComponentHealth::unhealthy(self.name(), e.to_string()))
    }

    /// Flush the WAL and drop expired rows.
    async fn reinitialize(&self) -> OverseerResult<()> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            db.checkpoint()?;
            db.cleanup_expired().map(|_| ())
        })
        .await
        .map_err(|e| OverseerError::dependency(self.name(), e.to_string()))?
    }
}

pub struct ConfidenceProbe {
    engine: Arc<AdaptiveConfidenceEngine>,
}

impl ConfidenceProbe {
    pub fn new(engine: Arc<AdaptiveConfidenceEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl IHealthProbe for ConfidenceProbe {
    fn name(&self) -> &str {
        overseer_confidence::engine::COMPONENT_NAME
    }

    async fn check(&self) -> ComponentHealth {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.health())
            .await
            .unwrap_or_else(|e| ComponentHealth::unhealthy(self.name(), e.to_string()))
    }

    /// Recompute calibration from what is on disk.
    async fn reinitialize(&self) -> OverseerResult<()> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.recalibrate().map(|_| ()))
            .await
            .map_err(|e| OverseerError::dependency(self.name(), e.to_string()))?
    }
}
