//! # Group Gate
//!
//! Bounded, group-exclusive resource scheduling primitives.
//!
//! A fixed pool of identical resource units ("cabins") is shared by clients
//! belonging to exactly two mutually exclusive groups. At any instant the
//! pool may be occupied by clients of only one group; units are reclaimed
//! and handed to the other group only once the pool has fully drained. This
//! is a generalized variant of the classic readers/writers family: a bounded
//! allocator, a two-state exclusive-group gate, per-group overflow queuing,
//! and a hand-off protocol that never deadlocks or admits a cross-group
//! occupancy violation.
//!
//! ## Core Guarantees
//!
//! - **Mutual exclusion**: at most one group occupies the pool at any time
//! - **Capacity bound**: a group never exceeds the configured unit count
//! - **No lost wake-ups**: every waiter is eventually admitted as long as
//!   every holder eventually leaves
//! - **Drain hand-off**: when the pool empties, the same group's overflow
//!   queue is re-admitted first; only with none queued does ownership switch
//!   to the opposite group (throughput over strict alternation; documented
//!   baseline, see [`Facility::leave`])
//!
//! ## Quick Start
//!
//! ```
//! use group_gate::{Facility, Group};
//! use std::thread;
//!
//! let facility = Facility::new(2).unwrap();
//!
//! let worker = {
//!     let facility = facility.clone();
//!     thread::spawn(move || {
//!         let permit = facility.enter(Group::B);
//!         // ... use the unit ...
//!         facility.leave(permit).unwrap();
//!     })
//! };
//!
//! let permit = facility.enter(Group::A);
//! facility.leave(permit).unwrap();
//! worker.join().unwrap();
//! ```
//!
//! ## Simulation Harness
//!
//! The [`core::simulation`] module spawns one OS thread per configured
//! client, each arriving with a random stagger and holding a unit for a
//! randomized duration: the original changing-room demo, driven through
//! the same public contract:
//!
//! ```
//! use group_gate::builders::run_simulation;
//! use group_gate::config::{FacilityConfig, SimulationConfig};
//!
//! let report = run_simulation(&SimulationConfig {
//!     facility: FacilityConfig { cabins: 2 },
//!     clients_a: 3,
//!     clients_b: 2,
//!     arrival_stagger_ms: 1,
//!     min_hold_ms: 1,
//!     max_hold_ms: 2,
//! })
//! .unwrap();
//! assert_eq!(report.completed, [3, 2]);
//! ```

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core facility state, admission protocol, and client harness.
pub mod core;
/// Configuration models for the facility and the simulation harness.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    AppResult, AuditEvent, AuditSink, Facility, FacilityError, FacilitySnapshot, Group,
    InMemoryAuditSink, Permit,
};
