//! # overseer-watchdog
//!
//! Scans supervised process output line by line. Each stream gets its own
//! scan loop; the first rule that matches a line produces an
//! [`ErrorEvent`](overseer_core::ErrorEvent) which is handed to every
//! registered callback in line order.
//!
//! Rules and callbacks are registered through `&mut Watchdog` before it is
//! wrapped in an `Arc` and streams are attached, so registration can never
//! race with a running scan loop.

pub mod callback;
pub mod registry;
pub mod rules;
pub mod watchdog;

pub use callback::EventCallback;
pub use registry::{PatternRegistry, PatternRule};
pub use watchdog::{ScanSummary, Watchdog};
