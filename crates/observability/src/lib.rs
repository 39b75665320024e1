//! Tracing/logging setup shared by gemledger binaries.

/// Initialize process-wide logging with the default filter (`info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
