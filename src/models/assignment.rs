//! Committed assignment and schedule models.
//!
//! Assignments are created by an external optimizer and committed through
//! the repository layer; this engine validates and mutates them only via
//! safety-gated resolutions and swap executions. A `Schedule` is the query
//! view over a set of assignments used by the detector, matcher, and
//! resilience analyzer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A committed (person, block, rotation) assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique assignment identifier.
    pub id: String,
    /// Assigned person.
    pub person_id: String,
    /// Assigned block.
    pub block_id: String,
    /// Assigned rotation.
    pub rotation_id: String,
    /// Lifecycle status.
    pub status: AssignmentStatus,
    /// Optimistic-concurrency version token; bumped on every mutation.
    pub version: u64,
}

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    /// Counts toward coverage and duty hours.
    Active,
    /// Superseded or withdrawn; retained for audit.
    Cancelled,
}

impl Assignment {
    /// Creates an active assignment at version 1.
    pub fn new(
        id: impl Into<String>,
        person_id: impl Into<String>,
        block_id: impl Into<String>,
        rotation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            person_id: person_id.into(),
            block_id: block_id.into(),
            rotation_id: rotation_id.into(),
            status: AssignmentStatus::Active,
            version: 1,
        }
    }

    /// Whether the assignment counts toward coverage.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

/// Query view over a set of committed assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// All assignments, active and cancelled.
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Looks up an assignment by id.
    pub fn assignment(&self, id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    /// Active assignments, in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| a.is_active())
    }

    /// Active assignments for a person.
    pub fn active_for_person(&self, person_id: &str) -> Vec<&Assignment> {
        self.active().filter(|a| a.person_id == person_id).collect()
    }

    /// Active assignments on a (block, rotation) slot.
    pub fn active_on_slot(&self, block_id: &str, rotation_id: &str) -> Vec<&Assignment> {
        self.active()
            .filter(|a| a.block_id == block_id && a.rotation_id == rotation_id)
            .collect()
    }

    /// Active assignment for a person in a block, if any.
    pub fn active_for_person_in_block(
        &self,
        person_id: &str,
        block_id: &str,
    ) -> Option<&Assignment> {
        self.active()
            .find(|a| a.person_id == person_id && a.block_id == block_id)
    }

    /// Active assignment count per person.
    pub fn load_by_person(&self) -> HashMap<String, usize> {
        let mut load: HashMap<String, usize> = HashMap::new();
        for a in self.active() {
            *load.entry(a.person_id.clone()).or_insert(0) += 1;
        }
        load
    }

    /// Number of active assignments.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schedule {
        let mut s = Schedule::new();
        s.add(Assignment::new("A1", "R01", "B01", "wards"));
        s.add(Assignment::new("A2", "R02", "B01", "wards"));
        s.add(Assignment::new("A3", "R01", "B02", "icu"));
        let mut cancelled = Assignment::new("A4", "R03", "B01", "icu");
        cancelled.status = AssignmentStatus::Cancelled;
        s.add(cancelled);
        s
    }

    #[test]
    fn test_slot_query_ignores_cancelled() {
        let s = sample();
        assert_eq!(s.active_on_slot("B01", "wards").len(), 2);
        assert_eq!(s.active_on_slot("B01", "icu").len(), 0);
        assert_eq!(s.active_count(), 3);
    }

    #[test]
    fn test_person_queries() {
        let s = sample();
        assert_eq!(s.active_for_person("R01").len(), 2);
        assert!(s.active_for_person_in_block("R01", "B02").is_some());
        assert!(s.active_for_person_in_block("R03", "B01").is_none());
    }

    #[test]
    fn test_load_by_person() {
        let s = sample();
        let load = s.load_by_person();
        assert_eq!(load["R01"], 2);
        assert_eq!(load["R02"], 1);
        assert!(!load.contains_key("R03"));
    }
}
