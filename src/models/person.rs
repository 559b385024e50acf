//! Person model.
//!
//! People are the assignable staff: residents (with a PGY level) and
//! faculty. The engine holds read-only person snapshots for the duration
//! of a run; the directory of record lives outside the core.

use serde::{Deserialize, Serialize};

/// A schedulable person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    /// Unique person identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Staff role.
    pub role: Role,
    /// Postgraduate year, residents only.
    pub pgy_level: Option<u8>,
    /// Held certifications (e.g., "BLS", "ACLS", "PALS").
    pub certifications: Vec<String>,
    /// Specialty interests, used as stated preferences in swap scoring.
    pub specialties: Vec<String>,
    /// Inactive people never enter the candidate domain.
    pub active: bool,
}

/// Staff role classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Trainee with a PGY level, subject to duty-hour and supervision rules.
    Resident,
    /// Attending/supervising staff.
    Faculty,
}

impl Person {
    /// Creates a resident at the given PGY level.
    pub fn resident(id: impl Into<String>, pgy_level: u8) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role: Role::Resident,
            pgy_level: Some(pgy_level),
            certifications: Vec::new(),
            specialties: Vec::new(),
            active: true,
        }
    }

    /// Creates a faculty member.
    pub fn faculty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role: Role::Faculty,
            pgy_level: None,
            certifications: Vec::new(),
            specialties: Vec::new(),
            active: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a certification.
    pub fn with_certification(mut self, cert: impl Into<String>) -> Self {
        self.certifications.push(cert.into());
        self
    }

    /// Adds a specialty interest.
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.push(specialty.into());
        self
    }

    /// Marks the person inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the person holds the given certification.
    pub fn has_certification(&self, cert: &str) -> bool {
        self.certifications.iter().any(|c| c == cert)
    }

    /// Whether the person lists the given specialty interest.
    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties.iter().any(|s| s == specialty)
    }

    /// Whether this is a resident.
    #[inline]
    pub fn is_resident(&self) -> bool {
        self.role == Role::Resident
    }

    /// Whether this is faculty.
    #[inline]
    pub fn is_faculty(&self) -> bool {
        self.role == Role::Faculty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_builder() {
        let p = Person::resident("R01", 2)
            .with_name("Dr. Kim")
            .with_certification("BLS")
            .with_certification("ACLS")
            .with_specialty("cardiology");

        assert_eq!(p.role, Role::Resident);
        assert_eq!(p.pgy_level, Some(2));
        assert!(p.has_certification("ACLS"));
        assert!(!p.has_certification("PALS"));
        assert!(p.has_specialty("cardiology"));
        assert!(p.active);
        assert!(p.is_resident());
    }

    #[test]
    fn test_faculty_has_no_pgy() {
        let f = Person::faculty("F01").with_name("Dr. Osei");
        assert_eq!(f.pgy_level, None);
        assert!(f.is_faculty());
    }

    #[test]
    fn test_inactive() {
        let p = Person::resident("R01", 1).inactive();
        assert!(!p.active);
    }
}
