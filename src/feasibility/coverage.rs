//! Coverage assessment over the reduced domain.
//!
//! Counts surviving candidates per (block, rotation) slot and classifies
//! each slot into a risk band against the rotation's declared minimum
//! staffing. Classification is a pure function so the resilience analyzer
//! can reuse it against hypothetical rosters.

use serde::{Deserialize, Serialize};

use crate::config::RiskThresholds;
use crate::feasibility::domain::CandidateDomain;
use crate::models::Snapshot;

/// Coverage risk band for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    /// Comfortable margin above the minimum.
    Adequate,
    /// Above the minimum but under the adequate ratio.
    Low,
    /// Exactly at the minimum; any loss breaks coverage.
    Medium,
    /// Below the minimum; the slot cannot be staffed.
    Infeasible,
}

/// Classifies a slot from its candidate count and staffing minimum.
///
/// A slot with no staffing requirement is always `Adequate`.
pub fn classify(available: usize, required: u32, thresholds: &RiskThresholds) -> RiskBand {
    if required == 0 {
        return RiskBand::Adequate;
    }
    let required_n = required as usize;
    if available < required_n {
        RiskBand::Infeasible
    } else if available == required_n {
        RiskBand::Medium
    } else if (available as f64) < (required as f64) * thresholds.adequate_ratio {
        RiskBand::Low
    } else {
        RiskBand::Adequate
    }
}

/// Coverage of one (block, rotation) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotCoverage {
    /// Block.
    pub block_id: String,
    /// Rotation.
    pub rotation_id: String,
    /// Surviving candidates.
    pub available: usize,
    /// Declared staffing minimum.
    pub required: u32,
    /// Risk classification.
    pub band: RiskBand,
}

/// Per-slot coverage over the whole grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// One entry per (block, rotation), block-major in snapshot order.
    pub slots: Vec<SlotCoverage>,
}

impl CoverageReport {
    /// Slots classified `Infeasible`.
    pub fn infeasible(&self) -> impl Iterator<Item = &SlotCoverage> {
        self.slots
            .iter()
            .filter(|s| s.band == RiskBand::Infeasible)
    }

    /// Slots at or below the given band severity.
    pub fn at_risk(&self, band: RiskBand) -> impl Iterator<Item = &SlotCoverage> + '_ {
        self.slots.iter().filter(move |s| s.band >= band)
    }

    /// Whether every slot can be staffed.
    pub fn all_feasible(&self) -> bool {
        self.infeasible().next().is_none()
    }
}

/// Computes coverage for every slot of the grid.
pub fn assess(
    domain: &CandidateDomain,
    snapshot: &Snapshot,
    thresholds: &RiskThresholds,
) -> CoverageReport {
    let mut slots = Vec::with_capacity(snapshot.blocks().len() * snapshot.rotations().len());
    for block in snapshot.blocks() {
        for rotation in snapshot.rotations() {
            let available = domain.on_slot(&block.id, &rotation.id).count();
            slots.push(SlotCoverage {
                block_id: block.id.clone(),
                rotation_id: rotation.id.clone(),
                available,
                required: rotation.required_per_block,
                band: classify(available, rotation.required_per_block, thresholds),
            });
        }
    }
    CoverageReport { slots }
}
