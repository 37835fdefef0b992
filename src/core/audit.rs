//! Audit sink for facility lifecycle events.
//!
//! Every admission, release, and hand-off decision can be recorded to a
//! pluggable sink for post-hoc inspection of the scheduling behavior. Events
//! are recorded under the facility's internal lock, so a sink sees them in
//! the exact order the transitions happened.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::facility::Group;

/// A single facility lifecycle event.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Permit the event relates to, when one exists (`wait` events precede
    /// permit issuance).
    pub permit: Option<String>,
    /// Group the event relates to. For hand-off events this is the group
    /// being admitted, not the one that drained.
    pub group: Group,
    /// Action taken: `wait`, `enter`, `leave`, `handoff-refill`,
    /// `handoff-switch`, or `idle`.
    pub action: String,
    /// Per-group occupancy after the transition, indexed `[A, B]`.
    pub occupancy_after: [u32; 2],
    /// Per-group waiting counts after the transition, indexed `[A, B]`.
    pub waiting_after: [u32; 2],
    /// Timestamp in milliseconds since the Unix epoch.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink with a bounded ring buffer.
///
/// Cloning yields a handle to the same buffer, so a test can keep one handle
/// and hand another to the facility.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a sink retaining at most `max_events` events, oldest dropped
    /// first.
    #[must_use]
    pub fn shared(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Snapshot of the retained events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: &str) -> AuditEvent {
        AuditEvent {
            event_id: action.to_string(),
            permit: None,
            group: Group::A,
            action: action.to_string(),
            occupancy_after: [0, 0],
            waiting_after: [0, 0],
            created_at_ms: 0,
        }
    }

    #[test]
    fn retains_most_recent_events() {
        let sink = InMemoryAuditSink::shared(2);
        let mut writer = sink.clone();
        writer.record(event("first"));
        writer.record(event("second"));
        writer.record(event("third"));

        let actions: Vec<String> = sink.events().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["second", "third"]);
    }

    #[test]
    fn clones_share_one_buffer() {
        let sink = InMemoryAuditSink::shared(8);
        sink.clone().record(event("enter"));
        assert_eq!(sink.events().len(), 1);
    }
}
