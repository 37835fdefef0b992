//! End-to-end simulation runs driven through config and builders.

use group_gate::builders::run_simulation;
use group_gate::config::{FacilityConfig, SimulationConfig};
use group_gate::core::simulation;
use group_gate::{Facility, InMemoryAuditSink};
use std::time::Duration;

fn quick_config(cabins: u32, clients_a: u32, clients_b: u32) -> SimulationConfig {
    SimulationConfig {
        facility: FacilityConfig { cabins },
        clients_a,
        clients_b,
        arrival_stagger_ms: 2,
        min_hold_ms: 1,
        max_hold_ms: 4,
    }
}

#[test]
fn all_clients_complete() {
    group_gate::util::init_tracing();
    let report = run_simulation(&quick_config(2, 5, 4)).unwrap();
    assert_eq!(report.completed, [5, 4]);
    assert!(report.peak_occupancy >= 1);
    assert!(report.peak_occupancy <= 2);
}

#[test]
fn single_group_run() {
    let report = run_simulation(&quick_config(3, 6, 0)).unwrap();
    assert_eq!(report.completed, [6, 0]);
    assert!(report.peak_occupancy <= 3);
}

#[test]
fn capacity_one_serializes_everyone() {
    let report = run_simulation(&quick_config(1, 3, 3)).unwrap();
    assert_eq!(report.completed, [3, 3]);
    assert_eq!(report.peak_occupancy, 1);
}

#[test]
fn facility_is_idle_after_run() {
    let cfg = quick_config(2, 4, 4);
    let facility = Facility::new(cfg.facility.cabins).unwrap();
    let report = simulation::run(&facility, &cfg).unwrap();
    assert_eq!(report.completed, [4, 4]);
    assert!(facility.is_idle());
}

#[test]
fn audit_trail_balances_enters_and_leaves() {
    let cfg = quick_config(2, 3, 3);
    let sink = InMemoryAuditSink::shared(256);
    let facility = Facility::new(cfg.facility.cabins)
        .unwrap()
        .with_audit(Box::new(sink.clone()));

    simulation::run(&facility, &cfg).unwrap();

    let events = sink.events();
    let count = |action: &str| events.iter().filter(|e| e.action == action).count();
    assert_eq!(count("enter"), 6);
    assert_eq!(count("leave"), 6);
    // Every recorded transition respected group exclusion.
    for event in &events {
        assert!(
            event.occupancy_after[0] == 0 || event.occupancy_after[1] == 0,
            "audit saw both groups occupying: {event:?}"
        );
    }
}

#[test]
fn max_wait_is_bounded_by_the_run() {
    let report = run_simulation(&quick_config(1, 2, 2)).unwrap();
    // Four serialized holds of at most 4ms plus stagger; anything near a
    // second means a waiter was forgotten.
    assert!(report.max_wait < Duration::from_secs(1));
}
