//! Process-wide tracing setup for embedders of the planning engine.

/// Initialize tracing from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init_with(&tracing::LogSettings::from_env());
}

/// Subscriber configuration (filter, output format).
pub mod tracing;
