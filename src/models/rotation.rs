//! Rotation model.
//!
//! A rotation is a service a person can be assigned to for a block:
//! an inpatient ward, an ICU, a continuity clinic, an elective. Rotations
//! carry the static eligibility data (PGY floor, required certifications,
//! activity type) and the operational parameters (weekly hours, call
//! frequency, supervision ratio, minimum staffing) that drive the
//! feasibility pipeline.

use serde::{Deserialize, Serialize};

use super::Role;

/// A rotation (service line) assignable per block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rotation {
    /// Unique rotation identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Activity classification; drives role and presence semantics.
    pub activity: ActivityType,
    /// Minimum PGY level for residents. `None` = open to all levels.
    pub min_pgy_level: Option<u8>,
    /// Certifications every assignee must hold.
    pub required_certifications: Vec<String>,
    /// Averaged scheduled weekly duty hours.
    pub avg_weekly_hours: u32,
    /// In-house call pattern.
    pub call_frequency: CallFrequency,
    /// Required supervising faculty per supervisee. `Some` means an on-site
    /// faculty assignment on the same (block, rotation) is required.
    pub supervision_ratio: Option<f64>,
    /// Minimum people required per block; 0 = no coverage requirement.
    pub required_per_block: u32,
}

/// Activity classification for a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    /// Resident-only ward service; attending coverage is external.
    InpatientCore,
    /// Acute care service (ICU, ED) staffed by residents and faculty.
    AcuteCare,
    /// Longitudinal sessional clinic.
    Clinic,
    /// Sessional elective or research time.
    Elective,
}

impl ActivityType {
    /// Whether the given role may be assigned to this activity type.
    pub fn permits(&self, role: Role) -> bool {
        match self {
            ActivityType::InpatientCore => role == Role::Resident,
            _ => true,
        }
    }

    /// Whether the activity demands continuous presence for the block.
    ///
    /// Sessional activities (clinic, elective) tolerate bounded absences:
    /// missed sessions are made up rather than invalidating the block.
    pub fn requires_full_presence(&self) -> bool {
        matches!(self, ActivityType::InpatientCore | ActivityType::AcuteCare)
    }
}

/// In-house call pattern for a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallFrequency {
    /// No overnight call.
    NoCall,
    /// Call every fourth night.
    Q4,
    /// Call every third night.
    Q3,
    /// Call every other night.
    Q2,
}

impl CallFrequency {
    /// Nights between call, or `None` when the rotation takes no call.
    pub fn interval_nights(&self) -> Option<u32> {
        match self {
            CallFrequency::NoCall => None,
            CallFrequency::Q4 => Some(4),
            CallFrequency::Q3 => Some(3),
            CallFrequency::Q2 => Some(2),
        }
    }

    /// Whether the rotation takes overnight call at all.
    pub fn takes_call(&self) -> bool {
        !matches!(self, CallFrequency::NoCall)
    }
}

impl Rotation {
    /// Creates a rotation with the given activity type.
    pub fn new(id: impl Into<String>, activity: ActivityType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            activity,
            min_pgy_level: None,
            required_certifications: Vec::new(),
            avg_weekly_hours: 50,
            call_frequency: CallFrequency::NoCall,
            supervision_ratio: None,
            required_per_block: 0,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the minimum PGY level.
    pub fn with_min_pgy(mut self, level: u8) -> Self {
        self.min_pgy_level = Some(level);
        self
    }

    /// Requires a certification of all assignees.
    pub fn with_certification(mut self, cert: impl Into<String>) -> Self {
        self.required_certifications.push(cert.into());
        self
    }

    /// Sets averaged weekly duty hours.
    pub fn with_weekly_hours(mut self, hours: u32) -> Self {
        self.avg_weekly_hours = hours;
        self
    }

    /// Sets the call frequency.
    pub fn with_call(mut self, call: CallFrequency) -> Self {
        self.call_frequency = call;
        self
    }

    /// Requires on-site faculty supervision at the given ratio.
    pub fn with_supervision(mut self, ratio: f64) -> Self {
        self.supervision_ratio = Some(ratio);
        self
    }

    /// Declares the minimum staffing per block.
    pub fn with_required_per_block(mut self, required: u32) -> Self {
        self.required_per_block = required;
        self
    }

    /// Whether the rotation requires on-site faculty supervision.
    #[inline]
    pub fn requires_supervision(&self) -> bool {
        self.supervision_ratio.is_some()
    }
}
