//! Swap request model.
//!
//! A swap request asks to trade away (or hand off) the requester's
//! assignment on a given block and rotation. Requests persist until
//! matched, executed, or cancelled.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to trade an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// Requesting person.
    pub requester: String,
    /// Trade semantics.
    pub kind: SwapKind,
    /// Block of the assignment to trade.
    pub block_id: String,
    /// Rotation of the assignment to trade.
    pub rotation_id: String,
    /// Lifecycle status.
    pub status: SwapStatus,
    /// Creation sequence number; earlier requests win score ties.
    pub created_seq: u64,
    /// Optimistic-concurrency version token.
    pub version: u64,
}

/// Trade semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapKind {
    /// Exchange assignments with a counterpart.
    OneToOne,
    /// A counterpart takes over the assignment outright.
    Absorb,
}

/// Swap request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStatus {
    /// Awaiting a match.
    Pending,
    /// A match was found but not yet executed.
    Matched,
    /// The trade was applied to the schedule.
    Executed,
    /// Withdrawn by the requester.
    Cancelled,
}

impl SwapRequest {
    /// Creates a pending request.
    pub fn new(
        requester: impl Into<String>,
        kind: SwapKind,
        block_id: impl Into<String>,
        rotation_id: impl Into<String>,
        created_seq: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester: requester.into(),
            kind,
            block_id: block_id.into(),
            rotation_id: rotation_id.into(),
            status: SwapStatus::Pending,
            created_seq,
            version: 1,
        }
    }

    /// Whether the request still awaits a match.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let r = SwapRequest::new("R01", SwapKind::OneToOne, "B03", "icu", 7);
        assert!(r.is_pending());
        assert_eq!(r.created_seq, 7);
        assert_eq!(r.kind, SwapKind::OneToOne);
    }
}
