//! # overseer-router
//!
//! The workflow as a directed weighted graph over stage names. Forward
//! edges give normal progression; curated backward edges give known
//! recovery paths. The router turns a strategic decision into the next
//! stage and keeps a transition history for analytics.

pub mod analytics;
pub mod graph;
pub mod router;

pub use analytics::RoutingAnalytics;
pub use graph::{Edge, StageGraph, StageId};
pub use router::{RouteResult, StageRouter, CURATED_BACKWARD_EDGES};
