//! Health aggregation across probed components.

mod reporter;

pub use reporter::HealthReporter;
