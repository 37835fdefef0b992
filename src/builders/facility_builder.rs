//! Construct facilities and simulations from validated configuration.

use anyhow::Context;

use crate::config::{FacilityConfig, SimulationConfig};
use crate::core::{simulation, AppResult, Facility, FacilityError, SimulationReport};

/// Build a [`Facility`] from configuration.
///
/// # Errors
///
/// Returns [`FacilityError::InvalidCapacity`] when the configured cabin
/// count is zero.
pub fn build_facility(cfg: &FacilityConfig) -> Result<Facility, FacilityError> {
    if cfg.validate().is_err() {
        return Err(FacilityError::InvalidCapacity);
    }
    Facility::new(cfg.cabins)
}

/// Build a facility from `cfg` and run a full simulation against it.
///
/// # Errors
///
/// Fails on invalid configuration or when any client thread fails.
pub fn run_simulation(cfg: &SimulationConfig) -> AppResult<SimulationReport> {
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;
    let facility = build_facility(&cfg.facility).context("building facility")?;
    simulation::run(&facility, cfg)
}
