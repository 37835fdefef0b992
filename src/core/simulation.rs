//! Thread-per-client simulation harness.
//!
//! Drives a [`Facility`] the way the original demo does: every client is an
//! independent OS thread that arrives with a random stagger, blocks in
//! [`Facility::enter`], holds its unit for a randomized duration, and leaves.
//! Per-client measurements travel back over a bounded crossbeam channel and
//! are aggregated into a [`SimulationReport`].

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel::bounded;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::core::error::{AppResult, FacilityError};
use crate::core::facility::{Facility, Group};

/// Measurements from a single simulated client.
#[derive(Debug, Clone)]
pub struct ClientReport {
    /// Client ordinal within its group (1-based, mirrors the demo's ids).
    pub client: u32,
    /// Group the client belongs to.
    pub group: Group,
    /// Time spent blocked in `enter`.
    pub waited: Duration,
    /// Time the unit was held.
    pub held: Duration,
    /// Own-group occupancy observed right after admission.
    pub occupancy_seen: u32,
}

/// Aggregate outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Clients that completed, indexed `[A, B]`.
    pub completed: [u32; 2],
    /// Highest own-group occupancy any client observed after admission.
    pub peak_occupancy: u32,
    /// Longest time any client spent blocked in `enter`.
    pub max_wait: Duration,
}

/// Run a full simulation against `facility`.
///
/// Spawns one thread per configured client, joins them all, and aggregates
/// their reports. Returns once every client has entered, held, and left;
/// the facility is idle again when this returns successfully.
///
/// # Errors
///
/// Fails if a client thread cannot be spawned, panics, or trips a facility
/// contract error on release.
pub fn run(facility: &Facility, cfg: &SimulationConfig) -> AppResult<SimulationReport> {
    let total = cfg.clients_a + cfg.clients_b;
    let (tx, rx) = bounded::<Result<ClientReport, FacilityError>>(total as usize);

    let mut handles = Vec::with_capacity(total as usize);
    for (group, count) in [(Group::A, cfg.clients_a), (Group::B, cfg.clients_b)] {
        for client in 1..=count {
            let facility = facility.clone();
            let tx = tx.clone();
            let cfg = cfg.clone();
            let handle = thread::Builder::new()
                .name(format!("client-{group}-{client}"))
                .spawn(move || {
                    let report = run_client(&facility, &cfg, group, client);
                    // Receiver outlives all clients; a send can only fail if
                    // the run was already torn down.
                    let _ = tx.send(report);
                })
                .with_context(|| format!("spawning client {client} of group {group}"))?;
            handles.push(handle);
        }
    }
    drop(tx);

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("client thread panicked"))?;
    }

    let mut report = SimulationReport {
        completed: [0, 0],
        peak_occupancy: 0,
        max_wait: Duration::ZERO,
    };
    for outcome in rx.iter() {
        let client = outcome.context("client failed to release its unit")?;
        report.completed[client.group.index()] += 1;
        report.peak_occupancy = report.peak_occupancy.max(client.occupancy_seen);
        report.max_wait = report.max_wait.max(client.waited);
    }
    tracing::info!(
        completed_a = report.completed[0],
        completed_b = report.completed[1],
        peak = report.peak_occupancy,
        "simulation finished"
    );
    Ok(report)
}

fn run_client(
    facility: &Facility,
    cfg: &SimulationConfig,
    group: Group,
    client: u32,
) -> Result<ClientReport, FacilityError> {
    let mut rng = rand::rng();
    if cfg.arrival_stagger_ms > 0 {
        thread::sleep(Duration::from_millis(
            rng.random_range(0..=cfg.arrival_stagger_ms),
        ));
    }
    tracing::info!(client, group = %group, "arrived at the facility");

    let t0 = Instant::now();
    let permit = facility.enter(group);
    let waited = t0.elapsed();

    let occupancy_seen = facility.snapshot().occupancy_of(group);
    tracing::info!(
        client,
        group = %group,
        occupancy = occupancy_seen,
        capacity = facility.capacity(),
        "took a unit"
    );

    let hold = Duration::from_millis(rng.random_range(cfg.min_hold_ms..=cfg.max_hold_ms));
    thread::sleep(hold);

    facility.leave(permit)?;
    tracing::info!(client, group = %group, "left the facility");

    Ok(ClientReport {
        client,
        group,
        waited,
        held: hold,
        occupancy_seen,
    })
}
