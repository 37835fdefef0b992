//! Group-exclusive bounded facility and its admission protocol.
//!
//! A [`Facility`] models a fixed pool of identical, anonymous resource units
//! ("cabins") shared by clients of two mutually exclusive groups. At any
//! instant only one group may hold occupancy; the pool is handed to the other
//! group only once it has fully drained. Clients blocked because the pool is
//! full (same group) or owned by the other group park on per-group condition
//! variables and are woken by the hand-off protocol in [`Facility::leave`].
//!
//! All decision-affecting state lives behind a single `parking_lot::Mutex`,
//! so checking an admission condition and blocking on it is atomic. Explicit
//! per-group waiting counters, maintained under the same lock, drive the
//! hand-off instead of inferring queue depth from wake-primitive internals.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::core::audit::{AuditEvent, AuditSink};
use crate::core::error::FacilityError;
use crate::util::clock::now_ms;

/// One of the two mutually exclusive client categories sharing the pool.
///
/// The classic instantiation is the unisex changing-room problem (men/women),
/// but the tags are deliberately neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// First group.
    A,
    /// Second group.
    B,
}

impl Group {
    /// The opposite group.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Consistent point-in-time view of the facility state.
///
/// Taken under the internal lock; useful for tests and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilitySnapshot {
    /// Number of resource units in the pool.
    pub capacity: u32,
    /// Occupants per group, indexed `[A, B]`.
    pub occupancy: [u32; 2],
    /// Blocked clients per group, indexed `[A, B]`.
    pub waiting: [u32; 2],
    /// Group currently owning the pool, if any.
    pub active: Option<Group>,
}

impl FacilitySnapshot {
    /// Occupancy of a specific group.
    #[must_use]
    pub const fn occupancy_of(&self, group: Group) -> u32 {
        self.occupancy[group.index()]
    }

    /// Waiting count of a specific group.
    #[must_use]
    pub const fn waiting_of(&self, group: Group) -> u32 {
        self.waiting[group.index()]
    }
}

/// Mutable room state; every field is read and written only under the lock.
struct RoomState {
    occupancy: [u32; 2],
    waiting: [u32; 2],
    active: Option<Group>,
}

struct Shared {
    capacity: u32,
    room: Mutex<RoomState>,
    /// One wait-set per group; covers both the overflow queue (own group at
    /// capacity) and the cross-group wait set (pool owned by the other group).
    doors: [Condvar; 2],
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

/// Proof of admission returned by [`Facility::enter`].
///
/// Consumed by [`Facility::leave`]. A permit dropped without being consumed
/// releases its unit as a safety net and logs the omission; relying on that
/// path is a programming error in the caller.
pub struct Permit {
    shared: Arc<Shared>,
    group: Group,
    id: Uuid,
    released: bool,
}

impl Permit {
    /// Group this permit admits.
    #[must_use]
    pub const fn group(&self) -> Group {
        self.group
    }

    /// Unique id of this permit, usable for audit correlation.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("group", &self.group)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!(permit = %self.id, group = %self.group, "permit dropped without leave; releasing");
        if let Err(e) = self.shared.release(self.group, self.id) {
            tracing::error!(permit = %self.id, "release on drop failed: {e}");
        }
    }
}

/// Shared handle to a group-exclusive bounded facility.
///
/// Cheap to clone; all clones refer to the same pool. Created once at startup
/// and shared by every client task for the whole run.
///
/// # Examples
///
/// ```
/// use group_gate::{Facility, Group};
///
/// let facility = Facility::new(2).unwrap();
/// let permit = facility.enter(Group::A);
/// assert_eq!(facility.snapshot().occupancy_of(Group::A), 1);
/// facility.leave(permit).unwrap();
/// assert!(facility.is_idle());
/// ```
#[derive(Clone)]
pub struct Facility {
    shared: Arc<Shared>,
}

impl fmt::Debug for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("Facility")
            .field("capacity", &snap.capacity)
            .field("occupancy", &snap.occupancy)
            .field("waiting", &snap.waiting)
            .field("active", &snap.active)
            .finish()
    }
}

impl Facility {
    /// Create a facility with `capacity` resource units.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: u32) -> Result<Self, FacilityError> {
        if capacity == 0 {
            return Err(FacilityError::InvalidCapacity);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                capacity,
                room: Mutex::new(RoomState {
                    occupancy: [0, 0],
                    waiting: [0, 0],
                    active: None,
                }),
                doors: [Condvar::new(), Condvar::new()],
                audit: None,
            }),
        })
    }

    /// Attach an audit sink recording admissions, releases, and hand-offs.
    ///
    /// Must be called before the facility handle is shared; there is no way
    /// to attach a sink to a facility already cloned out to clients.
    ///
    /// # Panics
    ///
    /// Panics if the handle has already been cloned.
    #[must_use]
    pub fn with_audit(self, sink: Box<dyn AuditSink>) -> Self {
        let mut shared =
            Arc::into_inner(self.shared).expect("with_audit requires a sole facility handle");
        shared.audit = Some(Mutex::new(sink));
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Number of resource units in the pool.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Whether the pool is empty with nobody waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let room = self.shared.room.lock();
        room.occupancy == [0, 0] && room.waiting == [0, 0] && room.active.is_none()
    }

    /// Consistent snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FacilitySnapshot {
        let room = self.shared.room.lock();
        FacilitySnapshot {
            capacity: self.shared.capacity,
            occupancy: room.occupancy,
            waiting: room.waiting,
            active: room.active,
        }
    }

    /// Block until a unit is available to `group`, then occupy it.
    ///
    /// Admission requires, atomically: the pool is unowned or owned by
    /// `group`, and `group` is below capacity. The first admitted client of a
    /// newly active group flips the ownership gate. The returned [`Permit`]
    /// must eventually be passed to [`Facility::leave`].
    ///
    /// # Panics
    ///
    /// Panics if group-exclusion accounting is found corrupted after the
    /// admission (an internal synchronization bug, never a caller error).
    #[must_use]
    pub fn enter(&self, group: Group) -> Permit {
        let mut room = self.shared.room.lock();
        if !Shared::admissible(&room, group, self.shared.capacity) {
            room.waiting[group.index()] += 1;
            self.shared.audit_event(&room, None, group, "wait");
            while !Shared::admissible(&room, group, self.shared.capacity) {
                self.shared.doors[group.index()].wait(&mut room);
            }
            room.waiting[group.index()] -= 1;
        }
        self.shared.admit(&mut room, group)
    }

    /// Non-blocking admission attempt.
    ///
    /// Returns `None` immediately when the pool is owned by the other group
    /// or `group` is at capacity.
    #[must_use]
    pub fn try_enter(&self, group: Group) -> Option<Permit> {
        let mut room = self.shared.room.lock();
        if Shared::admissible(&room, group, self.shared.capacity) {
            Some(self.shared.admit(&mut room, group))
        } else {
            None
        }
    }

    /// Like [`Facility::enter`] with a bounded wait.
    ///
    /// Returns `None` if no unit became available to `group` within
    /// `timeout`. The baseline contract has no cancellation; this is the
    /// documented extension for callers that cannot park indefinitely.
    #[must_use]
    pub fn enter_for(&self, group: Group, timeout: Duration) -> Option<Permit> {
        let deadline = Instant::now() + timeout;
        let mut room = self.shared.room.lock();
        if Shared::admissible(&room, group, self.shared.capacity) {
            return Some(self.shared.admit(&mut room, group));
        }
        room.waiting[group.index()] += 1;
        self.shared.audit_event(&room, None, group, "wait");
        while !Shared::admissible(&room, group, self.shared.capacity) {
            if self.shared.doors[group.index()]
                .wait_until(&mut room, deadline)
                .timed_out()
            {
                room.waiting[group.index()] -= 1;
                // A wake that raced with the deadline still counts.
                if Shared::admissible(&room, group, self.shared.capacity) {
                    return Some(self.shared.admit(&mut room, group));
                }
                // A hand-off may have pinned the empty pool open for this
                // waiter; pass ownership on (or idle the pool) so the other
                // group cannot be locked out by an abandoned wait.
                if room.occupancy == [0, 0]
                    && room.active == Some(group)
                    && room.waiting[group.index()] == 0
                {
                    self.shared.hand_off(&mut room, group, None);
                }
                return None;
            }
        }
        room.waiting[group.index()] -= 1;
        Some(self.shared.admit(&mut room, group))
    }

    /// Release the unit held by `permit`.
    ///
    /// Never blocks. If the release drains the pool to empty, runs the
    /// hand-off: same-group overflow waiters are re-admitted first
    /// (replace-and-continue); only with none queued does ownership switch to
    /// the opposite group's wait set. A release that merely frees a slot
    /// wakes at most one same-group overflow waiter.
    ///
    /// # Errors
    ///
    /// - [`FacilityError::PermitMisuse`] when the permit was issued by a
    ///   different facility.
    /// - [`FacilityError::InvariantViolation`] when the shared state is found
    ///   corrupted; fatal, the facility must not be used further.
    pub fn leave(&self, mut permit: Permit) -> Result<(), FacilityError> {
        if !Arc::ptr_eq(&self.shared, &permit.shared) {
            return Err(FacilityError::PermitMisuse(format!(
                "permit {} was issued by a different facility",
                permit.id
            )));
        }
        permit.released = true;
        self.shared.release(permit.group, permit.id)
    }
}

impl Shared {
    fn admissible(room: &RoomState, group: Group, capacity: u32) -> bool {
        room.active.is_none_or(|owner| owner == group) && room.occupancy[group.index()] < capacity
    }

    /// Occupy one unit for `group`. Caller has verified admissibility under
    /// the same lock acquisition.
    fn admit(self: &Arc<Self>, room: &mut RoomState, group: Group) -> Permit {
        room.occupancy[group.index()] += 1;
        if room.active.is_none() {
            room.active = Some(group);
            tracing::debug!(group = %group, "pool now owned");
        }
        assert!(
            room.occupancy[group.other().index()] == 0,
            "group exclusion violated: both groups occupy the pool"
        );
        assert!(
            room.occupancy[group.index()] <= self.capacity,
            "capacity bound violated for group {group}"
        );
        let id = Uuid::new_v4();
        tracing::debug!(
            permit = %id,
            group = %group,
            occupancy = room.occupancy[group.index()],
            capacity = self.capacity,
            "admitted"
        );
        self.audit_event(room, Some(id), group, "enter");
        Permit {
            shared: Arc::clone(self),
            group,
            id,
            released: false,
        }
    }

    fn release(&self, group: Group, id: Uuid) -> Result<(), FacilityError> {
        let mut room = self.room.lock();
        if room.occupancy[group.index()] == 0 {
            return Err(FacilityError::PermitMisuse(format!(
                "permit {id} released but group {group} holds no occupancy"
            )));
        }
        room.occupancy[group.index()] -= 1;
        if room.occupancy[group.other().index()] > 0 {
            let msg = format!(
                "both groups occupy the pool ({} vs {})",
                room.occupancy[0], room.occupancy[1]
            );
            tracing::error!(permit = %id, "{msg}");
            return Err(FacilityError::InvariantViolation(msg));
        }
        tracing::debug!(
            permit = %id,
            group = %group,
            occupancy = room.occupancy[group.index()],
            "released"
        );
        self.audit_event(&room, Some(id), group, "leave");
        if room.occupancy[group.index()] == 0 {
            self.hand_off(&mut room, group, Some(id));
        } else if room.waiting[group.index()] > 0 {
            // A slot just freed; one overflow waiter of the owning group can
            // take it.
            self.doors[group.index()].notify_one();
        }
        Ok(())
    }

    /// Decide which wait set is admitted after the pool drained to empty.
    ///
    /// Preference order: this group's own overflow queue (the pool re-opens
    /// for the same group, no forced switch), then the opposite group's
    /// cross-group wait set, then idle. Wakes exactly enough parked callers
    /// to fill the pool; the admission condition re-checked by each waiter
    /// under the lock keeps spurious or surplus wake-ups harmless.
    fn hand_off(&self, room: &mut RoomState, drained: Group, id: Option<Uuid>) {
        let own = drained.index();
        let other = drained.other();
        if room.waiting[own] > 0 {
            // active stays pinned to the drained group.
            let wake = room.waiting[own].min(self.capacity);
            tracing::debug!(group = %drained, wake, "hand-off: refilling from own overflow queue");
            self.audit_event(room, id, drained, "handoff-refill");
            for _ in 0..wake {
                self.doors[own].notify_one();
            }
        } else if room.waiting[other.index()] > 0 {
            room.active = Some(other);
            let wake = room.waiting[other.index()].min(self.capacity);
            tracing::debug!(from = %drained, to = %other, wake, "hand-off: switching groups");
            self.audit_event(room, id, other, "handoff-switch");
            for _ in 0..wake {
                self.doors[other.index()].notify_one();
            }
        } else {
            room.active = None;
            tracing::debug!(group = %drained, "pool drained, idle");
            self.audit_event(room, id, drained, "idle");
        }
    }

    fn audit_event(&self, room: &RoomState, permit: Option<Uuid>, group: Group, action: &str) {
        if let Some(sink) = &self.audit {
            sink.lock().record(AuditEvent {
                event_id: Uuid::new_v4().to_string(),
                permit: permit.map(|p| p.to_string()),
                group,
                action: action.to_string(),
                occupancy_after: room.occupancy,
                waiting_after: room.waiting,
                created_at_ms: now_ms(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::InMemoryAuditSink;
    use std::thread;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            Facility::new(0),
            Err(FacilityError::InvalidCapacity)
        ));
    }

    #[test]
    fn starts_idle() {
        let facility = Facility::new(3).unwrap();
        let snap = facility.snapshot();
        assert_eq!(snap.capacity, 3);
        assert_eq!(snap.occupancy, [0, 0]);
        assert_eq!(snap.waiting, [0, 0]);
        assert_eq!(snap.active, None);
        assert!(facility.is_idle());
    }

    #[test]
    fn first_admission_takes_ownership() {
        let facility = Facility::new(2).unwrap();
        let permit = facility.enter(Group::B);
        let snap = facility.snapshot();
        assert_eq!(snap.active, Some(Group::B));
        assert_eq!(snap.occupancy_of(Group::B), 1);
        facility.leave(permit).unwrap();
        assert_eq!(facility.snapshot().active, None);
    }

    #[test]
    fn try_enter_refuses_other_group() {
        let facility = Facility::new(2).unwrap();
        let held = facility.enter(Group::A);
        assert!(facility.try_enter(Group::B).is_none());
        // Same group still has a free unit.
        let second = facility.try_enter(Group::A).unwrap();
        assert!(facility.try_enter(Group::A).is_none());
        facility.leave(held).unwrap();
        facility.leave(second).unwrap();
    }

    #[test]
    fn enter_for_times_out_when_blocked() {
        let facility = Facility::new(1).unwrap();
        let held = facility.enter(Group::A);
        let t0 = Instant::now();
        assert!(facility
            .enter_for(Group::B, Duration::from_millis(50))
            .is_none());
        assert!(t0.elapsed() >= Duration::from_millis(50));
        // Timed-out waiter must not leak a waiting count.
        assert_eq!(facility.snapshot().waiting_of(Group::B), 0);
        facility.leave(held).unwrap();
    }

    #[test]
    fn foreign_permit_is_misuse() {
        let a = Facility::new(1).unwrap();
        let b = Facility::new(1).unwrap();
        let permit = a.enter(Group::A);
        match b.leave(permit) {
            Err(FacilityError::PermitMisuse(_)) => {}
            other => panic!("expected PermitMisuse, got {other:?}"),
        }
        // The permit drop released it back into `a`.
        assert!(a.is_idle());
    }

    #[test]
    fn dropped_permit_releases_unit() {
        let facility = Facility::new(1).unwrap();
        {
            let _permit = facility.enter(Group::A);
            assert_eq!(facility.snapshot().occupancy_of(Group::A), 1);
        }
        assert!(facility.is_idle());
    }

    #[test]
    fn blocked_opposite_group_admitted_after_drain() {
        let facility = Facility::new(2).unwrap();
        let held = facility.enter(Group::A);

        let worker = {
            let facility = facility.clone();
            thread::spawn(move || {
                let permit = facility.enter(Group::B);
                let active = facility.snapshot().active;
                facility.leave(permit).unwrap();
                active
            })
        };

        // Give the B client time to park on the cross-group wait set.
        while facility.snapshot().waiting_of(Group::B) == 0 {
            thread::yield_now();
        }
        assert_eq!(facility.snapshot().active, Some(Group::A));

        facility.leave(held).unwrap();
        assert_eq!(worker.join().unwrap(), Some(Group::B));
        assert!(facility.is_idle());
    }

    #[test]
    fn audit_records_lifecycle() {
        let sink = InMemoryAuditSink::shared(64);
        let facility = Facility::new(1)
            .unwrap()
            .with_audit(Box::new(sink.clone()));
        let permit = facility.enter(Group::A);
        facility.leave(permit).unwrap();
        let actions: Vec<String> = sink.events().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["enter", "leave", "idle"]);
    }
}
