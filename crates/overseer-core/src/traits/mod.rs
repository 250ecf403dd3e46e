mod health;
mod intervention;
mod remediation;
mod snapshot;

pub use health::IHealthProbe;
pub use intervention::{IInterventionBuilder, IKnowledgeLedger};
pub use remediation::IRemediationExecutor;
pub use snapshot::ISnapshotManager;
