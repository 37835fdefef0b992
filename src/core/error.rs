//! Error types for facility operations.

use thiserror::Error;

/// Errors produced by the facility.
///
/// There are no transient errors in this core: `enter` either blocks or
/// succeeds. Everything here is either a rejected configuration or a fatal
/// contract breach.
#[derive(Debug, Error)]
pub enum FacilityError {
    /// Facility constructed with zero capacity.
    #[error("capacity must be greater than 0")]
    InvalidCapacity,
    /// A permit was presented to the wrong facility or no longer matches any
    /// occupant. Programming error in the caller; the offending task should
    /// abort rather than continue against shared state.
    #[error("permit misuse: {0}")]
    PermitMisuse(String),
    /// Both groups were found occupying the pool at once. Can only arise
    /// from a synchronization bug; fatal, never silently repaired.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
