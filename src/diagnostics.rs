//! Warning sink used by the statistics parser.
//!
//! The parser never talks to a global logger directly. It reports non-fatal
//! problems through a [`Diagnostics`] value handed in by the caller, so tests
//! can capture warnings and the binary can forward them to `tracing`.

use tracing::warn;

/// Receives non-fatal warnings raised while parsing statistics.
pub trait Diagnostics {
    /// Reports a recoverable problem with the input.
    fn warn(&self, message: &str);
}

/// Forwards warnings to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        warn!(target: "unbound_collector::stats", "{}", message);
    }
}

/// Discards every warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn warn(&self, _message: &str) {}
}
