//! Safety-gated conflict resolution.
//!
//! Resolution options are generated read-only against the current schedule
//! and graded by risk. Nothing mutates until every safety gate passes
//! against the schedule as it stands at apply time: in a batch, each item
//! is re-gated after the previous items' mutations, so an option that was
//! safe at generation but invalidated by an earlier resolution is
//! escalated instead of applied. Gate failure never mutates anything, and
//! an escalation carries the failing gate results so a human sees exactly
//! what was rejected.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{
    Assignment, Conflict, ConflictKind, ConflictStatus, Role, Schedule, Snapshot,
};
use crate::store::ScheduleStore;

/// Operational risk grade of a resolution option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// A straight reassignment; slot coverage is unchanged.
    Low,
    /// A two-sided trade; both parties' schedules change.
    Medium,
    /// Cancellation with backfill; coverage briefly depends on the backfill.
    High,
}

/// The safety gates every mutation must clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyGate {
    /// PGY floor, certifications, activity role.
    Eligibility,
    /// No blocking absence and no double-booking in the block.
    Availability,
    /// Rotation hours within the person's (possibly reduced) cap.
    DutyHours,
    /// No touched slot drops below its staffing minimum.
    Coverage,
    /// Every touched supervision-required slot keeps its faculty, at ratio.
    Supervision,
    /// No person pushed unreasonably above the mean load.
    Workload,
}

/// One gate's verdict on a proposed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheck {
    /// Which gate.
    pub gate: SafetyGate,
    /// Whether it passed.
    pub passed: bool,
    /// What it found.
    pub detail: String,
}

/// A proposed schedule mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStrategy {
    /// Hand the assignment to a different person.
    Reassign {
        /// Assignment to change.
        assignment_id: String,
        /// New holder.
        to_person: String,
    },
    /// Trade persons between two assignments.
    Swap {
        /// The conflicted assignment.
        assignment_id: String,
        /// The counterpart assignment.
        counterpart_id: String,
    },
    /// Cancel the assignment and create a replacement for another person.
    CancelAndBackfill {
        /// Assignment to cancel.
        assignment_id: String,
        /// Person receiving the replacement assignment.
        backfill_person: String,
    },
}

impl ResolutionStrategy {
    /// Risk grade inherent to the strategy kind.
    pub fn risk(&self) -> RiskLevel {
        match self {
            ResolutionStrategy::Reassign { .. } => RiskLevel::Low,
            ResolutionStrategy::Swap { .. } => RiskLevel::Medium,
            ResolutionStrategy::CancelAndBackfill { .. } => RiskLevel::High,
        }
    }

    /// Assignment ids this strategy would change or create.
    pub fn impact(&self) -> Vec<String> {
        match self {
            ResolutionStrategy::Reassign { assignment_id, .. } => vec![assignment_id.clone()],
            ResolutionStrategy::Swap {
                assignment_id,
                counterpart_id,
            } => vec![assignment_id.clone(), counterpart_id.clone()],
            ResolutionStrategy::CancelAndBackfill { assignment_id, .. } => {
                vec![assignment_id.clone(), format!("{assignment_id}-bf")]
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ResolutionStrategy::Reassign {
                assignment_id,
                to_person,
            } => format!("reassign {assignment_id} to {to_person}"),
            ResolutionStrategy::Swap {
                assignment_id,
                counterpart_id,
            } => format!("swap {assignment_id} with {counterpart_id}"),
            ResolutionStrategy::CancelAndBackfill {
                assignment_id,
                backfill_person,
            } => format!("cancel {assignment_id} and backfill with {backfill_person}"),
        }
    }
}

/// A gated, graded resolution option for one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOption {
    /// Conflict this resolves.
    pub conflict_id: Uuid,
    /// The mutation to apply.
    pub strategy: ResolutionStrategy,
    /// Risk grade.
    pub risk: RiskLevel,
    /// Assignment ids the mutation changes or creates.
    pub impact: Vec<String>,
    /// The gate results the option was admitted under.
    pub checks: Vec<SafetyCheck>,
    /// Human-readable summary.
    pub detail: String,
}

impl ResolutionOption {
    fn new(conflict_id: Uuid, strategy: ResolutionStrategy, checks: Vec<SafetyCheck>) -> Self {
        Self {
            conflict_id,
            risk: strategy.risk(),
            impact: strategy.impact(),
            detail: strategy.describe(),
            strategy,
            checks,
        }
    }
}

/// Outcome of an automatic resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoResolveOutcome {
    /// The option was applied and the conflict closed.
    Applied(ResolutionOption),
    /// Nothing cleared the gates; the conflict was escalated. Carries the
    /// failing gate results of the rejected candidate, when one existed.
    Escalated(Vec<SafetyCheck>),
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Conflicts resolved, in processing order.
    pub resolved: Vec<String>,
    /// Conflicts escalated to a human.
    pub escalated: Vec<String>,
}

/// Applies a strategy to a cloned schedule, for gate evaluation.
fn hypothetical(strategy: &ResolutionStrategy, schedule: &Schedule) -> Option<Schedule> {
    let mut next = schedule.clone();
    match strategy {
        ResolutionStrategy::Reassign {
            assignment_id,
            to_person,
        } => {
            let a = next
                .assignments
                .iter_mut()
                .find(|a| a.id == *assignment_id && a.is_active())?;
            a.person_id = to_person.clone();
        }
        ResolutionStrategy::Swap {
            assignment_id,
            counterpart_id,
        } => {
            let person_a = next.assignment(assignment_id)?.person_id.clone();
            let person_b = next.assignment(counterpart_id)?.person_id.clone();
            next.assignments
                .iter_mut()
                .find(|a| a.id == *assignment_id)?
                .person_id = person_b;
            next.assignments
                .iter_mut()
                .find(|a| a.id == *counterpart_id)?
                .person_id = person_a;
        }
        ResolutionStrategy::CancelAndBackfill {
            assignment_id,
            backfill_person,
        } => {
            let (block_id, rotation_id) = {
                let a = next
                    .assignments
                    .iter_mut()
                    .find(|a| a.id == *assignment_id && a.is_active())?;
                a.status = crate::models::AssignmentStatus::Cancelled;
                (a.block_id.clone(), a.rotation_id.clone())
            };
            next.add(Assignment::new(
                format!("{assignment_id}-bf"),
                backfill_person.clone(),
                block_id,
                rotation_id,
            ));
        }
    }
    Some(next)
}

/// The assignments whose placement the strategy changes, post-state.
fn affected<'a>(strategy: &ResolutionStrategy, post: &'a Schedule) -> Vec<&'a Assignment> {
    strategy
        .impact()
        .iter()
        .filter_map(|id| post.assignment(id))
        .filter(|a| a.is_active())
        .collect()
}

/// Evaluates every gate for a strategy against the current schedule.
///
/// Always returns one check per gate, pass or fail, so callers can report
/// exactly which gate rejected an option.
pub fn run_safety_checks(
    strategy: &ResolutionStrategy,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Vec<SafetyCheck> {
    let Some(post) = hypothetical(strategy, schedule) else {
        return vec![SafetyCheck {
            gate: SafetyGate::Availability,
            passed: false,
            detail: "referenced assignment is missing or inactive".into(),
        }];
    };
    let touched = affected(strategy, &post);

    // Every slot the mutation touches, including the vacated one on a
    // cancel-and-backfill.
    let mut slots: Vec<(String, String)> = Vec::new();
    if let ResolutionStrategy::CancelAndBackfill { assignment_id, .. } = strategy {
        if let Some(a) = schedule.assignment(assignment_id) {
            slots.push((a.block_id.clone(), a.rotation_id.clone()));
        }
    }
    for a in &touched {
        slots.push((a.block_id.clone(), a.rotation_id.clone()));
    }
    slots.sort();
    slots.dedup();

    let mut checks = Vec::with_capacity(6);

    // Eligibility: PGY floor, certifications, activity role.
    let mut failures = Vec::new();
    for a in &touched {
        let (Some(person), Some(rotation)) = (
            snapshot.person(&a.person_id),
            snapshot.rotation(&a.rotation_id),
        ) else {
            failures.push(format!("unknown person or rotation on {}", a.id));
            continue;
        };
        if !rotation.activity.permits(person.role) {
            failures.push(format!("{} cannot take {}", person.id, rotation.id));
        }
        if let (Some(floor), Some(level)) = (rotation.min_pgy_level, person.pgy_level) {
            if level < floor {
                failures.push(format!("{} below PGY-{floor} for {}", person.id, rotation.id));
            }
        }
        for cert in &rotation.required_certifications {
            if !person.has_certification(cert) {
                failures.push(format!("{} lacks {cert} for {}", person.id, rotation.id));
            }
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::Eligibility,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "eligible".into()
        } else {
            failures.join("; ")
        },
    });

    // Availability: no blocking absence, no double-booking.
    let mut failures = Vec::new();
    for a in &touched {
        if let Some(block) = snapshot.block(&a.block_id) {
            if snapshot.is_blocked(&a.person_id, block) {
                failures.push(format!("{} is absent during {}", a.person_id, a.block_id));
            }
        }
        let booked = post
            .active()
            .filter(|other| other.person_id == a.person_id && other.block_id == a.block_id)
            .count();
        if booked > 1 {
            failures.push(format!(
                "{} would hold {booked} assignments in {}",
                a.person_id, a.block_id
            ));
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::Availability,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "available".into()
        } else {
            failures.join("; ")
        },
    });

    // Duty hours under the absence-adjusted cap.
    let mut failures = Vec::new();
    for a in &touched {
        let (Some(block), Some(rotation)) = (
            snapshot.block(&a.block_id),
            snapshot.rotation(&a.rotation_id),
        ) else {
            continue;
        };
        let mut cap = config.duty_hours.weekly_cap;
        if snapshot.is_reduced(&a.person_id, block) {
            cap = cap.saturating_sub(config.duty_hours.reduced_hour_penalty);
        }
        if rotation.avg_weekly_hours > cap {
            failures.push(format!(
                "{}h on {} exceeds {}h cap for {}",
                rotation.avg_weekly_hours, rotation.id, cap, a.person_id
            ));
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::DutyHours,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "within duty-hour cap".into()
        } else {
            failures.join("; ")
        },
    });

    // Coverage on every touched slot.
    let mut failures = Vec::new();
    for (block_id, rotation_id) in &slots {
        let Some(rotation) = snapshot.rotation(rotation_id) else {
            continue;
        };
        let staffed = post.active_on_slot(block_id, rotation_id).len();
        if staffed < rotation.required_per_block as usize {
            failures.push(format!(
                "{block_id}/{rotation_id} would drop to {staffed} of {}",
                rotation.required_per_block
            ));
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::Coverage,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "coverage held".into()
        } else {
            failures.join("; ")
        },
    });

    // Supervision: each touched supervision-required slot keeps at least
    // one faculty assignment, enough to meet the ratio for its residents.
    let mut failures = Vec::new();
    for (block_id, rotation_id) in &slots {
        let Some(rotation) = snapshot.rotation(rotation_id) else {
            continue;
        };
        let Some(ratio) = rotation.supervision_ratio else {
            continue;
        };
        let mut residents = 0usize;
        let mut faculty = 0usize;
        for a in post.active_on_slot(block_id, rotation_id) {
            match snapshot.person(&a.person_id).map(|p| p.role) {
                Some(Role::Resident) => residents += 1,
                Some(Role::Faculty) => faculty += 1,
                None => {}
            }
        }
        if residents > 0 {
            let needed = ((residents as f64) * ratio).ceil().max(1.0) as usize;
            if faculty < needed {
                failures.push(format!(
                    "{block_id}/{rotation_id} would hold {faculty} faculty for \
                     {residents} resident(s), needs {needed}"
                ));
            }
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::Supervision,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "supervision held".into()
        } else {
            failures.join("; ")
        },
    });

    // Workload fairness after the mutation.
    let load = post.load_by_person();
    let people = snapshot.people().iter().filter(|p| p.active).count().max(1);
    let mean = post.active_count() as f64 / people as f64;
    let limit = mean.ceil() as usize + config.resolver.max_workload_delta as usize;
    let mut failures = Vec::new();
    for a in &touched {
        let person_load = load.get(&a.person_id).copied().unwrap_or(0);
        if person_load > limit {
            failures.push(format!(
                "{} would carry {person_load} assignments (limit {limit})",
                a.person_id
            ));
        }
    }
    checks.push(SafetyCheck {
        gate: SafetyGate::Workload,
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            "workload balanced".into()
        } else {
            failures.join("; ")
        },
    });

    checks
}

/// Whether every gate passed.
pub fn is_safe(checks: &[SafetyCheck]) -> bool {
    checks.iter().all(|c| c.passed)
}

/// Candidate strategies for a conflict, ordered by risk then candidate id.
fn candidate_strategies(
    conflict: &Conflict,
    schedule: &Schedule,
    snapshot: &Snapshot,
) -> Vec<ResolutionStrategy> {
    if conflict.kind == ConflictKind::CoverageShortfall {
        return Vec::new();
    }
    let Some(target) = conflict
        .assignment_ids
        .iter()
        .filter_map(|id| schedule.assignment(id))
        .find(|a| a.is_active())
    else {
        return Vec::new();
    };

    let mut people: Vec<&str> = snapshot
        .people()
        .iter()
        .filter(|p| p.active && p.id != target.person_id)
        .map(|p| p.id.as_str())
        .collect();
    people.sort_unstable();

    let mut counterparts: Vec<&Assignment> = schedule
        .active()
        .filter(|a| a.block_id == target.block_id && a.person_id != target.person_id)
        .collect();
    counterparts.sort_by(|a, b| a.id.cmp(&b.id));

    let mut strategies = Vec::new();
    for person in &people {
        strategies.push(ResolutionStrategy::Reassign {
            assignment_id: target.id.clone(),
            to_person: (*person).to_string(),
        });
    }
    for counterpart in counterparts {
        strategies.push(ResolutionStrategy::Swap {
            assignment_id: target.id.clone(),
            counterpart_id: counterpart.id.clone(),
        });
    }
    for person in &people {
        strategies.push(ResolutionStrategy::CancelAndBackfill {
            assignment_id: target.id.clone(),
            backfill_person: (*person).to_string(),
        });
    }
    strategies
}

/// Generates gated resolution options for a conflict, ordered by risk then
/// candidate, bounded by the configured maximum. Each option carries the
/// assignments it would touch and the gate results it was admitted under.
///
/// Coverage shortfalls get no options: filling an empty slot is the
/// optimizer's job, not a local repair.
pub fn generate_options(
    conflict: &Conflict,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Vec<ResolutionOption> {
    let mut options = Vec::new();
    for strategy in candidate_strategies(conflict, schedule, snapshot) {
        if options.len() >= config.resolver.max_options {
            break;
        }
        let checks = run_safety_checks(&strategy, schedule, snapshot, config);
        if is_safe(&checks) {
            options.push(ResolutionOption::new(conflict.id, strategy, checks));
        }
    }
    options
}

/// Applies one option's mutation through the store, version-checked.
fn apply_option(option: &ResolutionOption, store: &mut ScheduleStore) -> Result<(), EngineError> {
    match &option.strategy {
        ResolutionStrategy::Reassign {
            assignment_id,
            to_person,
        } => {
            let version = store
                .assignment(assignment_id)
                .ok_or_else(|| EngineError::unknown("assignment", assignment_id.clone()))?
                .version;
            store.reassign(assignment_id, to_person, version)
        }
        ResolutionStrategy::Swap {
            assignment_id,
            counterpart_id,
        } => {
            let va = store
                .assignment(assignment_id)
                .ok_or_else(|| EngineError::unknown("assignment", assignment_id.clone()))?
                .version;
            let vb = store
                .assignment(counterpart_id)
                .ok_or_else(|| EngineError::unknown("assignment", counterpart_id.clone()))?
                .version;
            store.swap_persons(assignment_id, va, counterpart_id, vb)
        }
        ResolutionStrategy::CancelAndBackfill {
            assignment_id,
            backfill_person,
        } => {
            let original = store
                .assignment(assignment_id)
                .ok_or_else(|| EngineError::unknown("assignment", assignment_id.clone()))?
                .clone();
            store.cancel_assignment(assignment_id, original.version)?;
            store.insert_assignment(Assignment::new(
                format!("{assignment_id}-bf"),
                backfill_person.clone(),
                original.block_id,
                original.rotation_id,
            ));
            Ok(())
        }
    }
}

/// Applies a caller-chosen strategy to an open conflict, behind the gates.
///
/// The strategy is gated against the store's current schedule; on pass the
/// mutation applies and the conflict closes, on failure the conflict
/// escalates and the failing gate results are returned.
///
/// # Errors
/// [`EngineError::UnknownEntity`] for an unknown conflict;
/// [`EngineError::StaleData`] if a concurrent writer races the apply.
pub fn auto_resolve_if_safe(
    conflict_id: &str,
    strategy: ResolutionStrategy,
    store: &mut ScheduleStore,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<AutoResolveOutcome, EngineError> {
    let conflict = store
        .conflict(conflict_id)
        .ok_or_else(|| EngineError::unknown("conflict", conflict_id))?
        .clone();
    if !conflict.is_open() {
        return Ok(AutoResolveOutcome::Escalated(Vec::new()));
    }

    let schedule = store.schedule();
    let checks = run_safety_checks(&strategy, &schedule, snapshot, config);
    if is_safe(&checks) {
        let option = ResolutionOption::new(conflict.id, strategy, checks);
        apply_option(&option, store)?;
        store.set_conflict_status(conflict_id, ConflictStatus::Resolved, conflict.version)?;
        info!(conflict = conflict_id, detail = %option.detail, "conflict resolved");
        Ok(AutoResolveOutcome::Applied(option))
    } else {
        store.set_conflict_status(conflict_id, ConflictStatus::Escalated, conflict.version)?;
        let failed: Vec<SafetyCheck> = checks.into_iter().filter(|c| !c.passed).collect();
        debug!(
            conflict = conflict_id,
            gates = failed.len(),
            "strategy rejected; conflict escalated"
        );
        Ok(AutoResolveOutcome::Escalated(failed))
    }
}

/// Resolves one open conflict automatically if a sufficiently low-risk
/// candidate clears every safety gate against the store's current schedule.
///
/// Candidates are tried in risk order; the first safe one applies and the
/// conflict closes. When none clears the gates the conflict escalates, and
/// the outcome carries the failing gate results of the first rejected
/// candidate so the escalation names what was wrong.
///
/// # Errors
/// [`EngineError::UnknownEntity`] for an unknown conflict;
/// [`EngineError::StaleData`] if a concurrent writer races the apply.
pub fn auto_resolve(
    conflict_id: &str,
    max_risk: RiskLevel,
    store: &mut ScheduleStore,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<AutoResolveOutcome, EngineError> {
    let conflict = store
        .conflict(conflict_id)
        .ok_or_else(|| EngineError::unknown("conflict", conflict_id))?
        .clone();
    if !conflict.is_open() {
        return Ok(AutoResolveOutcome::Escalated(Vec::new()));
    }

    let schedule = store.schedule();
    let mut first_rejection: Vec<SafetyCheck> = Vec::new();
    for strategy in candidate_strategies(&conflict, &schedule, snapshot)
        .into_iter()
        .filter(|s| s.risk() <= max_risk)
    {
        let checks = run_safety_checks(&strategy, &schedule, snapshot, config);
        if is_safe(&checks) {
            let option = ResolutionOption::new(conflict.id, strategy, checks);
            apply_option(&option, store)?;
            store.set_conflict_status(conflict_id, ConflictStatus::Resolved, conflict.version)?;
            info!(conflict = conflict_id, detail = %option.detail, "conflict auto-resolved");
            return Ok(AutoResolveOutcome::Applied(option));
        }
        if first_rejection.is_empty() {
            first_rejection = checks.into_iter().filter(|c| !c.passed).collect();
        }
    }

    store.set_conflict_status(conflict_id, ConflictStatus::Escalated, conflict.version)?;
    debug!(conflict = conflict_id, "no safe option; conflict escalated");
    Ok(AutoResolveOutcome::Escalated(first_rejection))
}

/// Auto-resolves the given conflicts in order, re-gating each against the
/// schedule left by the previous resolutions.
///
/// # Errors
/// Propagates the first store error; conflicts already processed stay
/// applied.
pub fn batch_auto_resolve(
    conflict_ids: &[String],
    max_risk: RiskLevel,
    store: &mut ScheduleStore,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<BatchSummary, EngineError> {
    let mut summary = BatchSummary::default();
    for id in conflict_ids {
        match auto_resolve(id, max_risk, store, snapshot, config)? {
            AutoResolveOutcome::Applied(_) => summary.resolved.push(id.clone()),
            AutoResolveOutcome::Escalated(_) => summary.escalated.push(id.clone()),
        }
    }
    info!(
        resolved = summary.resolved.len(),
        escalated = summary.escalated.len(),
        "batch auto-resolution complete"
    );
    Ok(summary)
}

/// Sweep convenience: auto-resolves every open conflict in ID order.
///
/// # Errors
/// Same as [`batch_auto_resolve`].
pub fn batch_auto_resolve_open(
    max_risk: RiskLevel,
    store: &mut ScheduleStore,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<BatchSummary, EngineError> {
    let ids: Vec<String> = store.open_conflicts().map(|c| c.id.to_string()).collect();
    batch_auto_resolve(&ids, max_risk, store, snapshot, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Absence, ActivityType, Block, Person, Rotation};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// R01 is on leave during B01 but assigned there; R02 is free and
    /// qualified; R03 lacks the certification.
    fn leave_snapshot() -> Snapshot {
        Snapshot::new(
            vec![
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R02", 2).with_certification("ACLS"),
                Person::resident("R03", 2),
            ],
            vec![
                Block::new("B01", d(2025, 7, 1), d(2025, 7, 28)),
                Block::new("B02", d(2025, 7, 29), d(2025, 8, 25)),
            ],
            vec![
                Rotation::new("icu", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_weekly_hours(55)
                    .with_required_per_block(1),
                Rotation::new("elective", ActivityType::Elective).with_weekly_hours(40),
            ],
            vec![Absence::blocking("R01", d(2025, 7, 5), d(2025, 7, 10))],
        )
    }

    fn leave_store() -> (ScheduleStore, Conflict) {
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("A1", "R01", "B01", "icu"));
        let conflict = Conflict::new(ConflictKind::LeaveOverlap, "R01 absent during B01")
            .with_assignment("A1")
            .with_person("R01")
            .with_block("B01");
        store.insert_conflict(conflict.clone());
        (store, conflict)
    }

    /// A supervised ICU staffed by its only faculty member plus a resident;
    /// the faculty member has a leave overlap.
    fn supervised_store() -> (Snapshot, ScheduleStore, Conflict) {
        let snapshot = Snapshot::new(
            vec![
                Person::faculty("F01").with_certification("ACLS"),
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R02", 2).with_certification("ACLS"),
            ],
            vec![Block::new("B01", d(2025, 7, 1), d(2025, 7, 28))],
            vec![
                Rotation::new("icu", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_weekly_hours(55)
                    .with_supervision(0.25)
                    .with_required_per_block(1),
                Rotation::new("elective", ActivityType::Elective).with_weekly_hours(40),
            ],
            vec![Absence::blocking("F01", d(2025, 7, 5), d(2025, 7, 10))],
        );
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("A1", "F01", "B01", "icu"));
        store.insert_assignment(Assignment::new("A2", "R01", "B01", "icu"));
        let conflict = Conflict::new(ConflictKind::LeaveOverlap, "F01 absent during B01")
            .with_assignment("A1")
            .with_person("F01")
            .with_block("B01");
        store.insert_conflict(conflict.clone());
        (snapshot, store, conflict)
    }

    #[test]
    fn test_gates_reject_uncertified_candidate() {
        let snapshot = leave_snapshot();
        let (store, _) = leave_store();
        let schedule = store.schedule();
        let strategy = ResolutionStrategy::Reassign {
            assignment_id: "A1".into(),
            to_person: "R03".into(),
        };
        let checks = run_safety_checks(&strategy, &schedule, &snapshot, &EngineConfig::default());
        assert_eq!(checks.len(), 6);
        assert!(!is_safe(&checks));
        let eligibility = checks
            .iter()
            .find(|c| c.gate == SafetyGate::Eligibility)
            .unwrap();
        assert!(!eligibility.passed);
        assert!(eligibility.detail.contains("ACLS"));
    }

    #[test]
    fn test_gates_accept_qualified_candidate() {
        let snapshot = leave_snapshot();
        let (store, _) = leave_store();
        let strategy = ResolutionStrategy::Reassign {
            assignment_id: "A1".into(),
            to_person: "R02".into(),
        };
        let checks =
            run_safety_checks(&strategy, &store.schedule(), &snapshot, &EngineConfig::default());
        assert!(is_safe(&checks));
    }

    #[test]
    fn test_supervision_gate_blocks_removing_last_faculty() {
        // Reassigning the lone faculty's ICU slot to a resident passes
        // eligibility, availability, duty hours, and coverage, but leaves
        // the supervised slot without any faculty.
        let (snapshot, store, _) = supervised_store();
        let strategy = ResolutionStrategy::Reassign {
            assignment_id: "A1".into(),
            to_person: "R02".into(),
        };
        let checks =
            run_safety_checks(&strategy, &store.schedule(), &snapshot, &EngineConfig::default());
        assert!(!is_safe(&checks));
        let supervision = checks
            .iter()
            .find(|c| c.gate == SafetyGate::Supervision)
            .unwrap();
        assert!(!supervision.passed);
        assert!(supervision.detail.contains("0 faculty"));
        // Every other gate accepted the mutation.
        for check in checks.iter().filter(|c| c.gate != SafetyGate::Supervision) {
            assert!(check.passed, "{:?} should pass", check.gate);
        }
    }

    #[test]
    fn test_auto_resolve_never_strips_supervision() {
        let (snapshot, mut store, conflict) = supervised_store();
        let id = conflict.id.to_string();
        let outcome = auto_resolve(
            &id,
            RiskLevel::High,
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        // No candidate can replace the only supervisor; the conflict
        // escalates and the schedule is untouched.
        let AutoResolveOutcome::Escalated(failed) = outcome else {
            panic!("expected escalation");
        };
        assert!(failed.iter().any(|c| c.gate == SafetyGate::Supervision));
        assert_eq!(store.assignment("A1").unwrap().person_id, "F01");
        assert_eq!(store.assignment("A1").unwrap().version, 1);
        assert_eq!(
            store.conflict(&id).unwrap().status,
            ConflictStatus::Escalated
        );
    }

    #[test]
    fn test_options_carry_impact_and_checks() {
        let snapshot = leave_snapshot();
        let (store, conflict) = leave_store();
        let options =
            generate_options(&conflict, &store.schedule(), &snapshot, &EngineConfig::default());
        assert!(!options.is_empty());
        assert!(options.len() <= EngineConfig::default().resolver.max_options);
        // Reassign to R02 leads; risks never decrease down the list.
        assert_eq!(
            options[0].strategy,
            ResolutionStrategy::Reassign {
                assignment_id: "A1".into(),
                to_person: "R02".into(),
            }
        );
        assert_eq!(options[0].impact, vec!["A1".to_string()]);
        assert_eq!(options[0].checks.len(), 6);
        assert!(options[0].checks.iter().all(|c| c.passed));
        for pair in options.windows(2) {
            assert!(pair[0].risk <= pair[1].risk);
        }
        // A backfill option reports both the cancelled and the new id.
        if let Some(backfill) = options
            .iter()
            .find(|o| matches!(o.strategy, ResolutionStrategy::CancelAndBackfill { .. }))
        {
            assert_eq!(
                backfill.impact,
                vec!["A1".to_string(), "A1-bf".to_string()]
            );
        }
    }

    #[test]
    fn test_no_options_for_coverage_shortfall() {
        let snapshot = leave_snapshot();
        let conflict = Conflict::new(ConflictKind::CoverageShortfall, "B02/icu empty")
            .with_block("B02");
        let options = generate_options(
            &conflict,
            &Schedule::new(),
            &snapshot,
            &EngineConfig::default(),
        );
        assert!(options.is_empty());
    }

    #[test]
    fn test_auto_resolve_applies_and_closes() {
        let snapshot = leave_snapshot();
        let (mut store, conflict) = leave_store();
        let id = conflict.id.to_string();
        let outcome = auto_resolve(
            &id,
            RiskLevel::Low,
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        assert!(matches!(outcome, AutoResolveOutcome::Applied(_)));
        assert_eq!(store.assignment("A1").unwrap().person_id, "R02");
        assert_eq!(store.conflict(&id).unwrap().status, ConflictStatus::Resolved);
    }

    #[test]
    fn test_resolve_with_chosen_strategy() {
        let snapshot = leave_snapshot();
        let (mut store, conflict) = leave_store();
        let id = conflict.id.to_string();
        // The caller picks a backfill even though a reassign exists.
        let outcome = auto_resolve_if_safe(
            &id,
            ResolutionStrategy::CancelAndBackfill {
                assignment_id: "A1".into(),
                backfill_person: "R02".into(),
            },
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        let AutoResolveOutcome::Applied(option) = outcome else {
            panic!("expected application");
        };
        assert_eq!(option.risk, RiskLevel::High);
        assert_eq!(store.assignment("A1").unwrap().status, crate::models::AssignmentStatus::Cancelled);
        assert_eq!(store.assignment("A1-bf").unwrap().person_id, "R02");
        assert_eq!(store.conflict(&id).unwrap().status, ConflictStatus::Resolved);
    }

    #[test]
    fn test_chosen_strategy_rejected_names_gates() {
        let snapshot = leave_snapshot();
        let (mut store, conflict) = leave_store();
        let id = conflict.id.to_string();
        let outcome = auto_resolve_if_safe(
            &id,
            ResolutionStrategy::Reassign {
                assignment_id: "A1".into(),
                to_person: "R03".into(),
            },
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        let AutoResolveOutcome::Escalated(failed) = outcome else {
            panic!("expected escalation");
        };
        assert!(failed.iter().any(|c| c.gate == SafetyGate::Eligibility));
        assert_eq!(store.assignment("A1").unwrap().person_id, "R01");
        assert_eq!(
            store.conflict(&id).unwrap().status,
            ConflictStatus::Escalated
        );
    }

    #[test]
    fn test_gate_failure_escalates_without_mutating() {
        // Only candidates are uncertified or absent: nothing is safe.
        let snapshot = Snapshot::new(
            vec![
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R03", 2),
            ],
            vec![Block::new("B01", d(2025, 7, 1), d(2025, 7, 28))],
            vec![Rotation::new("icu", ActivityType::AcuteCare)
                .with_certification("ACLS")
                .with_required_per_block(1)],
            vec![Absence::blocking("R01", d(2025, 7, 5), d(2025, 7, 10))],
        );
        let (mut store, conflict) = leave_store();
        let id = conflict.id.to_string();
        let outcome = auto_resolve(
            &id,
            RiskLevel::High,
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        let AutoResolveOutcome::Escalated(failed) = outcome else {
            panic!("expected escalation");
        };
        assert!(!failed.is_empty());
        // Schedule untouched, conflict handed to a human.
        assert_eq!(store.assignment("A1").unwrap().person_id, "R01");
        assert_eq!(store.assignment("A1").unwrap().version, 1);
        assert_eq!(
            store.conflict(&id).unwrap().status,
            ConflictStatus::Escalated
        );
    }

    #[test]
    fn test_batch_re_gates_sequentially() {
        // Two leave conflicts compete for the single free candidate. The
        // first resolution books R02 into B01; the second must not
        // double-book them and escalates instead.
        let snapshot = Snapshot::new(
            vec![
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R02", 2).with_certification("ACLS"),
                Person::resident("R04", 2).with_certification("ACLS"),
            ],
            vec![Block::new("B01", d(2025, 7, 1), d(2025, 7, 28))],
            vec![
                Rotation::new("icu", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_required_per_block(1),
                Rotation::new("wards", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_required_per_block(1),
            ],
            vec![
                Absence::blocking("R01", d(2025, 7, 5), d(2025, 7, 10)),
                Absence::blocking("R04", d(2025, 7, 5), d(2025, 7, 10)),
            ],
        );
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("A1", "R01", "B01", "icu"));
        store.insert_assignment(Assignment::new("A2", "R04", "B01", "wards"));
        let c1 = Conflict::new(ConflictKind::LeaveOverlap, "R01 absent").with_assignment("A1");
        let c2 = Conflict::new(ConflictKind::LeaveOverlap, "R04 absent").with_assignment("A2");
        store.insert_conflict(c1);
        store.insert_conflict(c2);

        let summary = batch_auto_resolve_open(
            RiskLevel::Low,
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(summary.resolved.len(), 1);
        assert_eq!(summary.escalated.len(), 1);
        // R02 holds exactly one of the two assignments.
        let held_by_r02 = ["A1", "A2"]
            .iter()
            .filter(|id| store.assignment(id).unwrap().person_id == "R02")
            .count();
        assert_eq!(held_by_r02, 1);
    }

    #[test]
    fn test_batch_scopes_to_given_conflicts() {
        let snapshot = Snapshot::new(
            vec![
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R02", 2).with_certification("ACLS"),
                Person::resident("R04", 2).with_certification("ACLS"),
                Person::resident("R05", 2).with_certification("ACLS"),
            ],
            vec![Block::new("B01", d(2025, 7, 1), d(2025, 7, 28))],
            vec![
                Rotation::new("icu", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_required_per_block(1),
                Rotation::new("wards", ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_required_per_block(1),
            ],
            vec![
                Absence::blocking("R01", d(2025, 7, 5), d(2025, 7, 10)),
                Absence::blocking("R04", d(2025, 7, 5), d(2025, 7, 10)),
            ],
        );
        let mut store = ScheduleStore::new();
        store.insert_assignment(Assignment::new("A1", "R01", "B01", "icu"));
        store.insert_assignment(Assignment::new("A2", "R04", "B01", "wards"));
        let c1 = Conflict::new(ConflictKind::LeaveOverlap, "R01 absent").with_assignment("A1");
        let c2 = Conflict::new(ConflictKind::LeaveOverlap, "R04 absent").with_assignment("A2");
        let c1_id = c1.id.to_string();
        let c2_id = c2.id.to_string();
        store.insert_conflict(c1);
        store.insert_conflict(c2);

        let summary = batch_auto_resolve(
            &[c1_id.clone()],
            RiskLevel::Low,
            &mut store,
            &snapshot,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(summary.resolved, vec![c1_id.clone()]);
        assert!(summary.escalated.is_empty());
        // The out-of-scope conflict was never touched.
        assert!(store.conflict(&c2_id).unwrap().is_open());
        assert_eq!(store.assignment("A2").unwrap().person_id, "R04");
    }
}
