//! Configuration models for the facility and the simulation harness.

pub mod facility;

pub use facility::{FacilityConfig, SimulationConfig};
