//! Engine error types.
//!
//! Expected business outcomes (infeasible coverage, unsafe resolutions,
//! exceeded propagation budgets) are represented as status enums in the
//! corresponding reports, never as errors. `EngineError` covers the
//! caller-recoverable faults: concurrent modification, unknown record ids,
//! and structurally invalid input.

use thiserror::Error;

/// Faults surfaced to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A commit raced with a concurrent modification. The caller should
    /// re-read the record and retry.
    #[error("stale {entity} '{id}': expected version {expected}, found {found}")]
    StaleData {
        entity: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },

    /// A referenced record does not exist.
    #[error("unknown {entity} id '{id}'")]
    UnknownEntity { entity: &'static str, id: String },

    /// The input snapshot failed integrity validation.
    #[error("invalid snapshot: {0} validation error(s)")]
    InvalidSnapshot(usize),
}

impl EngineError {
    /// Shorthand for an unknown-entity error.
    pub fn unknown(entity: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = EngineError::StaleData {
            entity: "assignment",
            id: "A1".into(),
            expected: 2,
            found: 3,
        };
        assert!(e.to_string().contains("stale assignment 'A1'"));

        let e = EngineError::unknown("conflict", "deadbeef");
        assert!(e.to_string().contains("unknown conflict id"));
    }
}
