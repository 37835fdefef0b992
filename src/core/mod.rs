//! Core facility state, admission protocol, and client harness.

pub mod audit;
pub mod error;
pub mod facility;
pub mod simulation;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, FacilityError};
pub use facility::{Facility, FacilitySnapshot, Group, Permit};
pub use simulation::{ClientReport, SimulationReport};
