use async_trait::async_trait;

use crate::errors::OverseerResult;
use crate::models::{InterventionContext, RemediationAction, RemediationOutcome};

/// Runs remediation actions against the supervised agent.
#[async_trait]
pub trait IRemediationExecutor: Send + Sync {
    async fn execute(
        &self,
        actions: &[RemediationAction],
        context: &InterventionContext,
    ) -> OverseerResult<RemediationOutcome>;
}
