//! Absence model.
//!
//! Absences are approved time away: blocking absences (leave, deployment)
//! make full-presence assignments impossible in the overlapped blocks, while
//! reduced-availability absences (external commitments, part-time periods)
//! lower priority weight and tighten the duty-hour allowance without
//! removing eligibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An approved absence for a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absence {
    /// Affected person.
    pub person_id: String,
    /// Absence semantics.
    pub kind: AbsenceKind,
    /// First day away.
    pub start: NaiveDate,
    /// Last day away (inclusive).
    pub end: NaiveDate,
}

/// Absence semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceKind {
    /// Fully away; eliminates full-presence candidates in range.
    Blocking,
    /// Partially available; weight penalty and reduced hour allowance only.
    ReducedAvailability,
}

impl Absence {
    /// Creates a blocking absence.
    pub fn blocking(person_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            person_id: person_id.into(),
            kind: AbsenceKind::Blocking,
            start,
            end,
        }
    }

    /// Creates a reduced-availability absence.
    pub fn reduced(person_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            person_id: person_id.into(),
            kind: AbsenceKind::ReducedAvailability,
            start,
            end,
        }
    }

    /// Whether this absence intersects the given inclusive date range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_absence_overlap() {
        let a = Absence::blocking("R01", d(2025, 7, 10), d(2025, 7, 20));
        assert!(a.overlaps(d(2025, 7, 1), d(2025, 7, 28)));
        assert!(a.overlaps(d(2025, 7, 20), d(2025, 8, 1)));
        assert!(!a.overlaps(d(2025, 7, 21), d(2025, 8, 1)));
        assert_eq!(a.kind, AbsenceKind::Blocking);
    }

    #[test]
    fn test_reduced_kind() {
        let a = Absence::reduced("F01", d(2025, 9, 1), d(2025, 9, 14));
        assert_eq!(a.kind, AbsenceKind::ReducedAvailability);
        assert_eq!(a.person_id, "F01");
    }
}
