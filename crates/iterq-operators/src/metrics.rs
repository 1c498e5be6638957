//! Tracing hooks for cursor lifecycle events.
//!
//! Compiled to no-ops without the `tracing` feature.

use iterq_core::Error;

/// An operator released its upstream before exhaustion.
#[cfg(feature = "tracing")]
pub fn emit_close(op: &'static str) {
    tracing::trace!(op, "cursor closed");
}

#[cfg(not(feature = "tracing"))]
pub fn emit_close(_op: &'static str) {}

/// An operator drained its upstream into memory.
#[cfg(feature = "tracing")]
pub fn emit_materialized(op: &'static str, len: usize) {
    tracing::trace!(op, len, "materialized upstream");
}

#[cfg(not(feature = "tracing"))]
pub fn emit_materialized(_op: &'static str, _len: usize) {}

/// Cleanup failed where the error cannot be returned (inside `Drop`).
#[cfg(feature = "tracing")]
pub fn warn_cleanup(context: &'static str, err: &Error) {
    tracing::warn!(context, error = %err, "cleanup failed during drop");
}

#[cfg(not(feature = "tracing"))]
pub fn warn_cleanup(_context: &'static str, _err: &Error) {}

#[cfg(feature = "tracing")]
pub fn emit_registered(name: &str, replaced: bool) {
    tracing::debug!(name, replaced, "registered operator");
}

#[cfg(not(feature = "tracing"))]
pub fn emit_registered(_name: &str, _replaced: bool) {}
