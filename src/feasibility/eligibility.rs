//! Static eligibility reduction.
//!
//! Removes candidates that can never hold an assignment regardless of the
//! rest of the schedule: PGY level below the rotation's floor, missing
//! required certifications, or a role the activity type does not admit.
//! Predicates run in a fixed order (PGY, certification, activity) so the
//! per-predicate counters are reproducible across runs; the surviving set
//! is the same under any order, which makes the stage idempotent.

use crate::feasibility::domain::CandidateDomain;
use crate::models::Snapshot;

/// Candidates removed per eligibility predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityCounters {
    /// Resident PGY level below the rotation floor.
    pub pgy_level: usize,
    /// Missing a required certification.
    pub certification: usize,
    /// Role not admitted by the activity type.
    pub activity_role: usize,
}

impl EligibilityCounters {
    /// Total candidates removed across all predicates.
    pub fn total(&self) -> usize {
        self.pgy_level + self.certification + self.activity_role
    }
}

/// Runs the eligibility predicates over the domain in fixed order.
pub fn reduce(domain: &mut CandidateDomain, snapshot: &Snapshot) -> EligibilityCounters {
    let mut counters = EligibilityCounters::default();

    counters.pgy_level = domain.retain(|key| {
        let (Some(person), Some(rotation)) = (
            snapshot.person(&key.person_id),
            snapshot.rotation(&key.rotation_id),
        ) else {
            return false;
        };
        match (rotation.min_pgy_level, person.pgy_level) {
            (Some(floor), Some(level)) => level >= floor,
            // Faculty are not graded by PGY; the activity predicate decides.
            _ => true,
        }
    });

    counters.certification = domain.retain(|key| {
        let (Some(person), Some(rotation)) = (
            snapshot.person(&key.person_id),
            snapshot.rotation(&key.rotation_id),
        ) else {
            return false;
        };
        rotation
            .required_certifications
            .iter()
            .all(|cert| person.has_certification(cert))
    });

    counters.activity_role = domain.retain(|key| {
        let (Some(person), Some(rotation)) = (
            snapshot.person(&key.person_id),
            snapshot.rotation(&key.rotation_id),
        ) else {
            return false;
        };
        rotation.activity.permits(person.role)
    });

    counters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::domain::seed_domain;
    use crate::models::{ActivityType, Block, Person, Rotation};
    use chrono::NaiveDate;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Person::resident("R01", 1).with_certification("BLS"),
                Person::resident("R02", 3)
                    .with_certification("BLS")
                    .with_certification("ACLS"),
                Person::faculty("F01").with_certification("ACLS"),
            ],
            vec![Block::new(
                "B01",
                NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 28).unwrap(),
            )],
            vec![
                Rotation::new("senior-wards", ActivityType::InpatientCore).with_min_pgy(2),
                Rotation::new("icu", ActivityType::AcuteCare).with_certification("ACLS"),
                Rotation::new("elective", ActivityType::Elective),
            ],
            vec![],
        )
    }

    #[test]
    fn test_fixed_order_counters() {
        let s = snapshot();
        let mut domain = seed_domain(&s);
        assert_eq!(domain.len(), 9);

        let counters = reduce(&mut domain, &s);
        // R01 fails the PGY floor on senior-wards.
        assert_eq!(counters.pgy_level, 1);
        // R01 lacks ACLS for the ICU.
        assert_eq!(counters.certification, 1);
        // F01 cannot take the resident-only ward (PGY predicate skips faculty).
        assert_eq!(counters.activity_role, 1);
        assert_eq!(domain.len(), 9 - counters.total());
    }

    #[test]
    fn test_idempotent() {
        let s = snapshot();
        let mut domain = seed_domain(&s);
        reduce(&mut domain, &s);
        let after_first = domain.len();
        let second = reduce(&mut domain, &s);
        assert_eq!(second.total(), 0);
        assert_eq!(domain.len(), after_first);
    }

    #[test]
    fn test_dangling_key_dropped() {
        let s = snapshot();
        let mut domain = CandidateDomain::new();
        domain.insert(
            crate::feasibility::domain::CandidateKey::new("ghost", "B01", "elective"),
            0.0,
        );
        let counters = reduce(&mut domain, &s);
        assert_eq!(counters.pgy_level, 1);
        assert!(domain.is_empty());
    }
}
