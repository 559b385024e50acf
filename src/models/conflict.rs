//! Conflict model.
//!
//! Conflicts record rule violations on a committed schedule. Detection is
//! re-runnable; severity is a pure function of the violation kind and is
//! derived fresh on every detection pass, never stored state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A detected scheduling conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique conflict identifier.
    pub id: Uuid,
    /// Violation classification.
    pub kind: ConflictKind,
    /// Derived severity.
    pub severity: Severity,
    /// Lifecycle status.
    pub status: ConflictStatus,
    /// Affected assignment ids.
    pub assignment_ids: Vec<String>,
    /// Affected person, when the violation is person-scoped.
    pub person_id: Option<String>,
    /// Affected block, when the violation is slot-scoped.
    pub block_id: Option<String>,
    /// Human-readable detail.
    pub detail: String,
    /// Optimistic-concurrency version token.
    pub version: u64,
}

/// Conflict taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Assignment overlaps a blocking absence.
    LeaveOverlap,
    /// Call rotations in two consecutive blocks.
    BackToBack,
    /// Call rotations in three or more consecutive blocks.
    CallCascade,
    /// Rotation ping-pong (a, b, a) across consecutive blocks.
    ExcessiveAlternating,
    /// Heavy rotation under a reduced-availability commitment.
    ExternalCommitment,
    /// Slot staffed below its declared minimum.
    CoverageShortfall,
}

/// Conflict severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory; the schedule remains operable.
    Soft,
    /// Regulatory or operational breach requiring action.
    Hard,
}

/// Conflict lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictStatus {
    /// Awaiting resolution.
    Open,
    /// Closed by an applied resolution.
    Resolved,
    /// Handed to a human after automatic resolution was rejected.
    Escalated,
}

impl ConflictKind {
    /// Severity for this violation kind. Pure; detection derives severity
    /// from here on every pass.
    pub fn severity(&self) -> Severity {
        match self {
            ConflictKind::LeaveOverlap
            | ConflictKind::CallCascade
            | ConflictKind::CoverageShortfall => Severity::Hard,
            ConflictKind::BackToBack
            | ConflictKind::ExcessiveAlternating
            | ConflictKind::ExternalCommitment => Severity::Soft,
        }
    }
}

impl Conflict {
    /// Creates an open conflict with severity derived from the kind.
    pub fn new(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity: kind.severity(),
            status: ConflictStatus::Open,
            assignment_ids: Vec::new(),
            person_id: None,
            block_id: None,
            detail: detail.into(),
            version: 1,
        }
    }

    /// Attaches an affected assignment.
    pub fn with_assignment(mut self, assignment_id: impl Into<String>) -> Self {
        self.assignment_ids.push(assignment_id.into());
        self
    }

    /// Scopes the conflict to a person.
    pub fn with_person(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }

    /// Scopes the conflict to a block.
    pub fn with_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    /// Whether the conflict is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ConflictStatus::Open
    }
}
