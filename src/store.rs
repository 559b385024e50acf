//! Versioned storage for schedule mutations.
//!
//! Every mutable entity (assignment, conflict, swap request) carries a
//! version counter that increments on each write. Mutations must present
//! the version they read; a mismatch fails with [`EngineError::StaleData`]
//! and leaves the store untouched. This gives optimistic concurrency
//! control without locks: concurrent writers race on the version check
//! and the loser retries against fresh state.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::models::{
    Assignment, AssignmentStatus, Conflict, ConflictStatus, Schedule, SwapRequest, SwapStatus,
};

/// Versioned store for assignments, conflicts, and swap requests.
///
/// # Example
/// ```
/// use rotaplan::store::ScheduleStore;
/// use rotaplan::models::Assignment;
///
/// let mut store = ScheduleStore::new();
/// let a = Assignment::new("a1", "R01", "B01", "icu");
/// store.insert_assignment(a);
/// let found = store.assignment("a1").unwrap();
/// assert_eq!(found.version, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    assignments: BTreeMap<String, Assignment>,
    conflicts: BTreeMap<String, Conflict>,
    swaps: BTreeMap<String, SwapRequest>,
    swap_seq: u64,
}

impl ScheduleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an assignment, replacing any previous entry with the same ID.
    pub fn insert_assignment(&mut self, assignment: Assignment) {
        self.assignments
            .insert(assignment.id.clone(), assignment);
    }

    /// Looks up an assignment by ID.
    pub fn assignment(&self, id: &str) -> Option<&Assignment> {
        self.assignments.get(id)
    }

    /// Iterates all assignments in ID order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Cancels an assignment, checked against the version the caller read.
    ///
    /// # Errors
    /// [`EngineError::StaleData`] if `expected_version` doesn't match;
    /// [`EngineError::UnknownEntity`] if the ID is unknown.
    pub fn cancel_assignment(
        &mut self,
        id: &str,
        expected_version: u64,
    ) -> Result<(), EngineError> {
        let assignment = self
            .assignments
            .get_mut(id)
            .ok_or_else(|| EngineError::unknown("assignment", id))?;
        if assignment.version != expected_version {
            return Err(EngineError::StaleData {
                entity: "assignment".into(),
                id: id.into(),
                expected: expected_version,
                found: assignment.version,
            });
        }
        assignment.status = AssignmentStatus::Cancelled;
        assignment.version += 1;
        Ok(())
    }

    /// Reassigns an assignment to a different person, version-checked.
    ///
    /// # Errors
    /// [`EngineError::StaleData`] if `expected_version` doesn't match;
    /// [`EngineError::UnknownEntity`] if the ID is unknown.
    pub fn reassign(
        &mut self,
        id: &str,
        new_person_id: &str,
        expected_version: u64,
    ) -> Result<(), EngineError> {
        let assignment = self
            .assignments
            .get_mut(id)
            .ok_or_else(|| EngineError::unknown("assignment", id))?;
        if assignment.version != expected_version {
            return Err(EngineError::StaleData {
                entity: "assignment".into(),
                id: id.into(),
                expected: expected_version,
                found: assignment.version,
            });
        }
        assignment.person_id = new_person_id.into();
        assignment.version += 1;
        Ok(())
    }

    /// Swaps the persons of two assignments atomically, version-checked on both.
    ///
    /// Both version checks pass before either assignment changes.
    ///
    /// # Errors
    /// [`EngineError::StaleData`] or [`EngineError::UnknownEntity`] on either side.
    pub fn swap_persons(
        &mut self,
        id_a: &str,
        version_a: u64,
        id_b: &str,
        version_b: u64,
    ) -> Result<(), EngineError> {
        for (id, expected) in [(id_a, version_a), (id_b, version_b)] {
            let assignment = self
                .assignments
                .get(id)
                .ok_or_else(|| EngineError::unknown("assignment", id))?;
            if assignment.version != expected {
                return Err(EngineError::StaleData {
                    entity: "assignment".into(),
                    id: id.into(),
                    expected,
                    found: assignment.version,
                });
            }
        }
        let person_a = self.assignments[id_a].person_id.clone();
        let person_b = self.assignments[id_b].person_id.clone();
        {
            let a = self.assignments.get_mut(id_a).ok_or_else(|| {
                EngineError::unknown("assignment", id_a)
            })?;
            a.person_id = person_b;
            a.version += 1;
        }
        {
            let b = self.assignments.get_mut(id_b).ok_or_else(|| {
                EngineError::unknown("assignment", id_b)
            })?;
            b.person_id = person_a;
            b.version += 1;
        }
        Ok(())
    }

    /// Inserts a conflict, replacing any previous entry with the same ID.
    pub fn insert_conflict(&mut self, conflict: Conflict) {
        self.conflicts.insert(conflict.id.to_string(), conflict);
    }

    /// Looks up a conflict by ID.
    pub fn conflict(&self, id: &str) -> Option<&Conflict> {
        self.conflicts.get(id)
    }

    /// Iterates all conflicts in ID order.
    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.values()
    }

    /// Iterates open conflicts in ID order.
    pub fn open_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.values().filter(|c| c.is_open())
    }

    /// Transitions a conflict's status, version-checked.
    ///
    /// # Errors
    /// [`EngineError::StaleData`] if `expected_version` doesn't match;
    /// [`EngineError::UnknownEntity`] if the ID is unknown.
    pub fn set_conflict_status(
        &mut self,
        id: &str,
        status: ConflictStatus,
        expected_version: u64,
    ) -> Result<(), EngineError> {
        let conflict = self
            .conflicts
            .get_mut(id)
            .ok_or_else(|| EngineError::unknown("conflict", id))?;
        if conflict.version != expected_version {
            return Err(EngineError::StaleData {
                entity: "conflict".into(),
                id: id.into(),
                expected: expected_version,
                found: conflict.version,
            });
        }
        conflict.status = status;
        conflict.version += 1;
        Ok(())
    }

    /// Inserts a swap request, stamping it with the next submission sequence.
    pub fn insert_swap(&mut self, mut swap: SwapRequest) {
        self.swap_seq += 1;
        swap.created_seq = self.swap_seq;
        self.swaps.insert(swap.id.to_string(), swap);
    }

    /// Looks up a swap request by ID.
    pub fn swap(&self, id: &str) -> Option<&SwapRequest> {
        self.swaps.get(id)
    }

    /// Iterates all swap requests in ID order.
    pub fn swaps(&self) -> impl Iterator<Item = &SwapRequest> {
        self.swaps.values()
    }

    /// Iterates pending swap requests in submission order.
    pub fn pending_swaps(&self) -> Vec<&SwapRequest> {
        let mut pending: Vec<_> = self.swaps.values().filter(|s| s.is_pending()).collect();
        pending.sort_by_key(|s| s.created_seq);
        pending
    }

    /// Transitions a swap request's status, version-checked.
    ///
    /// # Errors
    /// [`EngineError::StaleData`] if `expected_version` doesn't match;
    /// [`EngineError::UnknownEntity`] if the ID is unknown.
    pub fn set_swap_status(
        &mut self,
        id: &str,
        status: SwapStatus,
        expected_version: u64,
    ) -> Result<(), EngineError> {
        let swap = self
            .swaps
            .get_mut(id)
            .ok_or_else(|| EngineError::unknown("swap request", id))?;
        if swap.version != expected_version {
            return Err(EngineError::StaleData {
                entity: "swap request".into(),
                id: id.into(),
                expected: expected_version,
                found: swap.version,
            });
        }
        swap.status = status;
        swap.version += 1;
        Ok(())
    }

    /// Builds a read-only schedule view over current assignments.
    pub fn schedule(&self) -> Schedule {
        let mut schedule = Schedule::new();
        for a in self.assignments.values() {
            schedule.add(a.clone());
        }
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictKind, SwapKind};

    #[test]
    fn test_version_bump_on_cancel() {
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("a1", "R01", "B01", "icu"));
        store.cancel_assignment("a1", 1).unwrap();
        let a = store.assignment("a1").unwrap();
        assert_eq!(a.status, AssignmentStatus::Cancelled);
        assert_eq!(a.version, 2);
    }

    #[test]
    fn test_stale_version_rejected() {
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("a1", "R01", "B01", "icu"));
        store.cancel_assignment("a1", 1).unwrap();
        // Second writer still holds version 1.
        let err = store.reassign("a1", "R02", 1).unwrap_err();
        assert!(matches!(err, EngineError::StaleData { found: 2, .. }));
        assert_eq!(store.assignment("a1").unwrap().person_id, "R01");
    }

    #[test]
    fn test_unknown_assignment() {
        let mut store = ScheduleStore::new();
        let err = store.cancel_assignment("missing", 1).unwrap_err();
        assert!(matches!(err, EngineError::UnknownEntity { .. }));
    }

    #[test]
    fn test_swap_persons_atomic() {
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("a1", "R01", "B01", "icu"));
        store.insert_assignment(Assignment::new("a2", "R02", "B01", "wards"));
        store.swap_persons("a1", 1, "a2", 1).unwrap();
        assert_eq!(store.assignment("a1").unwrap().person_id, "R02");
        assert_eq!(store.assignment("a2").unwrap().person_id, "R01");
        assert_eq!(store.assignment("a1").unwrap().version, 2);
    }

    #[test]
    fn test_swap_persons_stale_side_blocks_both() {
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("a1", "R01", "B01", "icu"));
        store.insert_assignment(Assignment::new("a2", "R02", "B01", "wards"));
        store.cancel_assignment("a2", 1).unwrap();
        let err = store.swap_persons("a1", 1, "a2", 1).unwrap_err();
        assert!(matches!(err, EngineError::StaleData { .. }));
        // Neither side changed.
        assert_eq!(store.assignment("a1").unwrap().person_id, "R01");
        assert_eq!(store.assignment("a1").unwrap().version, 1);
    }

    #[test]
    fn test_conflict_status_transition() {
        let mut store = ScheduleStore::new();
        let conflict = Conflict::new(ConflictKind::LeaveOverlap, "overlap");
        let id = conflict.id.to_string();
        store.insert_conflict(conflict);
        store
            .set_conflict_status(&id, ConflictStatus::Resolved, 1)
            .unwrap();
        assert_eq!(store.conflict(&id).unwrap().status, ConflictStatus::Resolved);
    }

    #[test]
    fn test_pending_swaps_submission_order() {
        let mut store = ScheduleStore::new();
        let s1 = SwapRequest::new("R01", SwapKind::OneToOne, "B01", "icu", 0);
        let s2 = SwapRequest::new("R02", SwapKind::Absorb, "B02", "wards", 0);
        let id1 = s1.id.to_string();
        store.insert_swap(s1);
        store.insert_swap(s2);
        let pending = store.pending_swaps();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id.to_string(), id1);
    }
}
