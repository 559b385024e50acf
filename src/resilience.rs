//! Contingency and resilience analysis.
//!
//! Answers "what breaks if we lose this person" (and the N-2 variant for
//! pairs) without touching the real schedule. The simulation cancels the
//! lost people's assignments, then backfills broken slots round by round:
//! each round pulls at most one donor per broken slot from the same block,
//! taking only donors whose departure breaks nothing else. The depth bound
//! caps the rounds, so a deeper analysis can only backfill more, never
//! less.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::feasibility::coverage::{classify, SlotCoverage};
use crate::models::{Schedule, Snapshot};

/// Which assignments and blocks a loss disturbs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadius {
    /// Assignments the lost people held, cancelled by the simulation.
    pub direct_assignments: Vec<String>,
    /// Donor assignments moved to re-cover broken slots.
    pub transitive_assignments: Vec<String>,
    /// Blocks touched by the cancellations or the donor moves, sorted.
    pub affected_blocks: Vec<String>,
}

impl BlastRadius {
    /// Assignments the lost people held.
    pub fn direct(&self) -> usize {
        self.direct_assignments.len()
    }

    /// Donor moves needed to re-cover broken slots.
    pub fn transitive(&self) -> usize {
        self.transitive_assignments.len()
    }

    /// Total disturbed assignments.
    pub fn total(&self) -> usize {
        self.direct() + self.transitive()
    }
}

/// How well the schedule absorbs a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DefenseLevel {
    /// No slot drops below its minimum.
    Safe,
    /// Slots break but enough of them can be re-covered within the depth.
    Degraded,
    /// Too many broken slots stay unfilled.
    Critical,
}

/// Result of one simulated loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyResult {
    /// The people simulated as lost.
    pub people: Vec<String>,
    /// Backfill rounds allowed.
    pub depth: u32,
    /// Disturbance footprint.
    pub blast: BlastRadius,
    /// Slots still below minimum after backfilling, with risk bands.
    pub shortfalls: Vec<SlotCoverage>,
    /// Broken slots successfully re-covered.
    pub backfilled: usize,
    /// Overall grade.
    pub defense: DefenseLevel,
    /// Added average load per remaining active person.
    pub burnout_delta: f64,
}

fn eligible_for(snapshot: &Snapshot, person_id: &str, rotation_id: &str, block_id: &str) -> bool {
    let (Some(person), Some(rotation), Some(block)) = (
        snapshot.person(person_id),
        snapshot.rotation(rotation_id),
        snapshot.block(block_id),
    ) else {
        return false;
    };
    if !rotation.activity.permits(person.role) {
        return false;
    }
    if let (Some(floor), Some(level)) = (rotation.min_pgy_level, person.pgy_level) {
        if level < floor {
            return false;
        }
    }
    if !rotation
        .required_certifications
        .iter()
        .all(|c| person.has_certification(c))
    {
        return false;
    }
    !snapshot.is_blocked(person_id, block)
}

fn simulate(
    people_out: &[&str],
    depth: u32,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> ContingencyResult {
    let mut work = schedule.clone();
    let mut direct_assignments = Vec::new();
    let mut affected_blocks = Vec::new();
    for a in work.assignments.iter_mut() {
        if a.is_active() && people_out.contains(&a.person_id.as_str()) {
            a.status = crate::models::AssignmentStatus::Cancelled;
            direct_assignments.push(a.id.clone());
            affected_blocks.push(a.block_id.clone());
        }
    }

    let broken_slots = |sched: &Schedule| -> Vec<(String, String, usize, u32)> {
        let mut out = Vec::new();
        for block in snapshot.blocks() {
            for rotation in snapshot.rotations() {
                if rotation.required_per_block == 0 {
                    continue;
                }
                let staffed = sched.active_on_slot(&block.id, &rotation.id).len();
                if staffed < rotation.required_per_block as usize {
                    out.push((
                        block.id.clone(),
                        rotation.id.clone(),
                        staffed,
                        rotation.required_per_block,
                    ));
                }
            }
        }
        out
    };

    let initially_broken = broken_slots(&work).len();
    let mut transitive_assignments: Vec<String> = Vec::new();

    for round in 0..depth {
        let broken = broken_slots(&work);
        if broken.is_empty() {
            break;
        }
        let mut moved_any = false;
        for (block_id, rotation_id, _, _) in &broken {
            // One donor per broken slot per round: an eligible person in
            // the same block whose own slot survives their departure.
            let donor = work
                .active()
                .filter(|a| a.block_id == *block_id && a.rotation_id != *rotation_id)
                .filter(|a| !people_out.contains(&a.person_id.as_str()))
                .filter(|a| eligible_for(snapshot, &a.person_id, rotation_id, block_id))
                .filter(|a| {
                    let Some(rotation) = snapshot.rotation(&a.rotation_id) else {
                        return false;
                    };
                    let staffed = work.active_on_slot(&a.block_id, &a.rotation_id).len();
                    staffed > rotation.required_per_block as usize
                })
                .min_by(|a, b| a.id.cmp(&b.id))
                .map(|a| a.id.clone());
            if let Some(donor_id) = donor {
                if let Some(a) = work.assignments.iter_mut().find(|a| a.id == donor_id) {
                    a.rotation_id = rotation_id.clone();
                    affected_blocks.push(a.block_id.clone());
                    transitive_assignments.push(donor_id);
                    moved_any = true;
                }
            }
        }
        debug!(
            round,
            moved = transitive_assignments.len(),
            "contingency backfill round"
        );
        if !moved_any {
            break;
        }
    }

    let remaining = broken_slots(&work);
    let shortfalls: Vec<SlotCoverage> = remaining
        .iter()
        .map(|(block_id, rotation_id, staffed, required)| SlotCoverage {
            block_id: block_id.clone(),
            rotation_id: rotation_id.clone(),
            available: *staffed,
            required: *required,
            band: classify(*staffed, *required, &config.coverage),
        })
        .collect();

    let backfilled = initially_broken - remaining.len();
    let defense = if initially_broken == 0 {
        DefenseLevel::Safe
    } else if (backfilled as f64) / (initially_broken as f64) >= config.coverage.degraded_ratio {
        DefenseLevel::Degraded
    } else {
        DefenseLevel::Critical
    };

    let remaining_people = snapshot
        .people()
        .iter()
        .filter(|p| p.active && !people_out.contains(&p.id.as_str()))
        .count()
        .max(1);
    let burnout_delta = direct_assignments.len() as f64 / remaining_people as f64;

    affected_blocks.sort_unstable();
    affected_blocks.dedup();

    ContingencyResult {
        people: people_out.iter().map(|p| (*p).to_string()).collect(),
        depth,
        blast: BlastRadius {
            direct_assignments,
            transitive_assignments,
            affected_blocks,
        },
        shortfalls,
        backfilled,
        defense,
        burnout_delta,
    }
}

/// Simulates losing one person, backfilling for up to `depth` rounds.
///
/// # Errors
/// [`EngineError::UnknownEntity`] for an unknown person.
pub fn analyze_contingency(
    person_id: &str,
    depth: u32,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<ContingencyResult, EngineError> {
    if snapshot.person(person_id).is_none() {
        return Err(EngineError::unknown("person", person_id));
    }
    Ok(simulate(&[person_id], depth, schedule, snapshot, config))
}

/// Simulates losing every pair of active people (N-2), in snapshot order.
///
/// Quadratic in headcount; intended for periodic review runs, not request
/// paths.
pub fn analyze_pairs(
    depth: u32,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Vec<ContingencyResult> {
    let people: Vec<&str> = snapshot
        .people()
        .iter()
        .filter(|p| p.active)
        .map(|p| p.id.as_str())
        .collect();
    let mut results = Vec::new();
    for (i, a) in people.iter().enumerate() {
        for b in &people[i + 1..] {
            results.push(simulate(&[*a, *b], depth, schedule, snapshot, config));
        }
    }
    results
}
