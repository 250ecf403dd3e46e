use async_trait::async_trait;

use crate::errors::OverseerResult;
use crate::models::ComponentHealth;

/// A component the controller probes on its health interval.
#[async_trait]
pub trait IHealthProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> ComponentHealth;

    /// Rebuild internal state in place after a failed probe.
    async fn reinitialize(&self) -> OverseerResult<()> {
        Ok(())
    }
}
