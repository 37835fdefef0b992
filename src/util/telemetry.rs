//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing for binaries and tests.
///
/// Installs an env-filtered fmt subscriber unless the caller already set a
/// dispatcher; safe to call more than once.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
