//! # overseer-recall
//!
//! RecallDB: persisted, TTL-scoped memory of error occurrences, pattern
//! violations, and remediation commands. Messages are reduced to a
//! normalized signature before storage so that the same failure at a
//! different path or line is recognised as a repeat.

pub mod db;
pub mod queries;
pub mod signature;

pub use db::RecallDb;
pub use signature::{normalize, SignatureNormalizer};
