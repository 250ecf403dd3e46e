//! Severity classification. Pure: no I/O, no model calls.

use overseer_core::models::{ErrorEvent, Severity};

/// Error types that always warrant an intervention, whatever severity
/// the matching rule assigned.
pub const ALWAYS_CRITICAL: &[&str] = &[
    "ModuleNotFoundError",
    "ImportError",
    "SyntaxError",
    "RustCompileError",
    "Panic",
    "Segfault",
    "OutOfMemory",
];

/// Whether `event` should send the controller to INTERVENING.
pub fn is_critical(event: &ErrorEvent) -> bool {
    event.severity >= Severity::High || ALWAYS_CRITICAL.contains(&event.error_type.as_str())
}
