use async_trait::async_trait;

use crate::errors::OverseerResult;
use crate::models::{InterventionContext, InterventionPlan, KnowledgeEntry, KnowledgeQuery};

/// Turns an intervention context into a structured plan.
#[async_trait]
pub trait IInterventionBuilder: Send + Sync {
    async fn build(&self, context: &InterventionContext) -> OverseerResult<InterventionPlan>;
}

/// Cross-task knowledge retrieval.
#[async_trait]
pub trait IKnowledgeLedger: Send + Sync {
    /// Ranked entries, best first, at most `limit`.
    async fn query(&self, query: &KnowledgeQuery, limit: usize)
        -> OverseerResult<Vec<KnowledgeEntry>>;
}
