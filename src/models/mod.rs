//! Rostering domain models.
//!
//! Core data types for residency/faculty rotation scheduling: the people,
//! blocks, rotations, and absences that feed a feasibility run, and the
//! committed assignments, conflicts, and swap requests the engine operates
//! on afterwards.
//!
//! | Type | Owned by | Lifecycle |
//! |------|----------|-----------|
//! | `Person`, `Block`, `Rotation`, `Absence` | external directory | read-only snapshot per run |
//! | `Assignment` | external optimizer (creation) | until cancelled/superseded |
//! | `Conflict` | detection passes | until resolved or escalated |
//! | `SwapRequest` | requesters | until executed/cancelled |

mod absence;
mod assignment;
mod block;
mod conflict;
mod person;
mod rotation;
mod snapshot;
mod swap;

pub use absence::{Absence, AbsenceKind};
pub use assignment::{Assignment, AssignmentStatus, Schedule};
pub use block::Block;
pub use conflict::{Conflict, ConflictKind, ConflictStatus, Severity};
pub use person::{Person, Role};
pub use rotation::{ActivityType, CallFrequency, Rotation};
pub use snapshot::Snapshot;
pub use swap::{SwapKind, SwapRequest, SwapStatus};
