//! Builders to construct scheduler components from configuration.

pub mod facility_builder;

pub use facility_builder::{build_facility, run_simulation};
