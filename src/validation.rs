//! Input validation for scheduling runs.
//!
//! Checks structural integrity of the snapshot before any pipeline stage
//! runs. Detects:
//! - Duplicate IDs
//! - Absences referencing unknown people
//! - Inverted date ranges
//! - Residents without a PGY level / faculty with one
//! - Supervision ratios outside (0, 1]

use crate::models::{Role, Snapshot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An absence references a person that doesn't exist.
    InvalidPersonReference,
    /// A date range ends before it starts.
    InvertedRange,
    /// A resident lacks a PGY level, or faculty carries one.
    InconsistentLevel,
    /// A supervision ratio is not in (0, 1].
    InvalidSupervisionRatio,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a run snapshot.
///
/// Checks:
/// 1. No duplicate person/block/rotation IDs
/// 2. All absence person references resolve
/// 3. Block and absence date ranges are non-inverted
/// 4. Residents carry a PGY level; faculty do not
/// 5. Supervision ratios lie in (0, 1]
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationResult {
    let mut errors = Vec::new();

    let mut seen = std::collections::HashSet::new();
    for p in snapshot.people() {
        if !seen.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate person ID: {}", p.id),
            ));
        }
        match (p.role, p.pgy_level) {
            (Role::Resident, None) => errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentLevel,
                format!("Resident '{}' has no PGY level", p.id),
            )),
            (Role::Faculty, Some(_)) => errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentLevel,
                format!("Faculty '{}' carries a PGY level", p.id),
            )),
            _ => {}
        }
    }

    let mut seen = std::collections::HashSet::new();
    for b in snapshot.blocks() {
        if !seen.insert(b.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate block ID: {}", b.id),
            ));
        }
        if b.end < b.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedRange,
                format!("Block '{}' ends before it starts", b.id),
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for r in snapshot.rotations() {
        if !seen.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate rotation ID: {}", r.id),
            ));
        }
        if let Some(ratio) = r.supervision_ratio {
            if !(ratio > 0.0 && ratio <= 1.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidSupervisionRatio,
                    format!("Rotation '{}' supervision ratio {ratio} not in (0, 1]", r.id),
                ));
            }
        }
    }

    for a in snapshot.absences() {
        if snapshot.person(&a.person_id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPersonReference,
                format!("Absence references unknown person '{}'", a.person_id),
            ));
        }
        if a.end < a.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedRange,
                format!("Absence for '{}' ends before it starts", a.person_id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
