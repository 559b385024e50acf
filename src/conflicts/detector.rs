//! Conflict detection over a committed schedule.
//!
//! Re-runnable and read-only: every pass re-derives the full conflict set
//! from the current schedule and snapshot, in a deterministic order
//! (person-scoped checks in snapshot person order, slot checks block-major).
//! Severity comes from [`ConflictKind::severity`], never from stored state.

use crate::config::EngineConfig;
use crate::models::{Conflict, ConflictKind, Schedule, Snapshot};

/// Runs every detection check and returns the conflicts found.
pub fn detect(schedule: &Schedule, snapshot: &Snapshot, config: &EngineConfig) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    detect_leave_overlaps(schedule, snapshot, &mut conflicts);
    detect_call_runs(schedule, snapshot, &mut conflicts);
    detect_alternating(schedule, snapshot, &mut conflicts);
    detect_external_commitments(schedule, snapshot, config, &mut conflicts);
    detect_coverage_shortfalls(schedule, snapshot, &mut conflicts);
    conflicts
}

/// An active assignment overlapping the person's blocking absence.
fn detect_leave_overlaps(schedule: &Schedule, snapshot: &Snapshot, out: &mut Vec<Conflict>) {
    for person in snapshot.people() {
        for assignment in schedule.active_for_person(&person.id) {
            let Some(block) = snapshot.block(&assignment.block_id) else {
                continue;
            };
            if snapshot.is_blocked(&person.id, block) {
                out.push(
                    Conflict::new(
                        ConflictKind::LeaveOverlap,
                        format!(
                            "{} is assigned to {} during an approved absence",
                            person.id, assignment.block_id
                        ),
                    )
                    .with_assignment(&assignment.id)
                    .with_person(&person.id)
                    .with_block(&assignment.block_id),
                );
            }
        }
    }
}

/// Runs of consecutive call-taking blocks: two in a row is a back-to-back,
/// three or more is a cascade. A run reports once, anchored at its first
/// block, and a cascade subsumes the back-to-back it contains.
fn detect_call_runs(schedule: &Schedule, snapshot: &Snapshot, out: &mut Vec<Conflict>) {
    for person in snapshot.people() {
        let mut call_positions: Vec<(usize, &str, &str)> = schedule
            .active_for_person(&person.id)
            .into_iter()
            .filter_map(|a| {
                let rotation = snapshot.rotation(&a.rotation_id)?;
                if !rotation.call_frequency.takes_call() {
                    return None;
                }
                let pos = snapshot.block_position(&a.block_id)?;
                Some((pos, a.id.as_str(), a.block_id.as_str()))
            })
            .collect();
        call_positions.sort_by_key(|&(pos, _, _)| pos);

        let mut i = 0;
        while i < call_positions.len() {
            let mut j = i;
            while j + 1 < call_positions.len()
                && call_positions[j + 1].0 == call_positions[j].0 + 1
            {
                j += 1;
            }
            let run_len = j - i + 1;
            if run_len >= 2 {
                let kind = if run_len >= 3 {
                    ConflictKind::CallCascade
                } else {
                    ConflictKind::BackToBack
                };
                let mut conflict = Conflict::new(
                    kind,
                    format!(
                        "{} holds call rotations in {} consecutive blocks starting {}",
                        person.id, run_len, call_positions[i].2
                    ),
                )
                .with_person(&person.id)
                .with_block(call_positions[i].2);
                for &(_, assignment_id, _) in &call_positions[i..=j] {
                    conflict = conflict.with_assignment(assignment_id);
                }
                out.push(conflict);
            }
            i = j + 1;
        }
    }
}

/// Rotation ping-pong: the same rotation in blocks n and n+2 with a
/// different rotation between them.
fn detect_alternating(schedule: &Schedule, snapshot: &Snapshot, out: &mut Vec<Conflict>) {
    for person in snapshot.people() {
        let mut by_position: Vec<(usize, &str, &str)> = schedule
            .active_for_person(&person.id)
            .into_iter()
            .filter_map(|a| {
                let pos = snapshot.block_position(&a.block_id)?;
                Some((pos, a.rotation_id.as_str(), a.id.as_str()))
            })
            .collect();
        by_position.sort_by_key(|&(pos, _, _)| pos);

        for window in by_position.windows(3) {
            let [(p0, r0, a0), (p1, r1, a1), (p2, r2, a2)] = window else {
                continue;
            };
            if p0 + 1 == *p1 && p1 + 1 == *p2 && r0 == r2 && r0 != r1 {
                out.push(
                    Conflict::new(
                        ConflictKind::ExcessiveAlternating,
                        format!("{} alternates {} / {} / {}", person.id, r0, r1, r2),
                    )
                    .with_assignment(*a0)
                    .with_assignment(*a1)
                    .with_assignment(*a2)
                    .with_person(&person.id),
                );
            }
        }
    }
}

/// A heavy rotation held during a reduced-availability period.
///
/// Heavy means the rotation's hours exceed the person's reduced duty-hour
/// cap for the block.
fn detect_external_commitments(
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
    out: &mut Vec<Conflict>,
) {
    let reduced_cap = config
        .duty_hours
        .weekly_cap
        .saturating_sub(config.duty_hours.reduced_hour_penalty);
    for person in snapshot.people() {
        for assignment in schedule.active_for_person(&person.id) {
            let (Some(block), Some(rotation)) = (
                snapshot.block(&assignment.block_id),
                snapshot.rotation(&assignment.rotation_id),
            ) else {
                continue;
            };
            if snapshot.is_reduced(&person.id, block) && rotation.avg_weekly_hours > reduced_cap {
                out.push(
                    Conflict::new(
                        ConflictKind::ExternalCommitment,
                        format!(
                            "{} holds {}h rotation {} during a reduced-availability period",
                            person.id, rotation.avg_weekly_hours, rotation.id
                        ),
                    )
                    .with_assignment(&assignment.id)
                    .with_person(&person.id)
                    .with_block(&assignment.block_id),
                );
            }
        }
    }
}

/// A slot staffed below its declared minimum.
fn detect_coverage_shortfalls(schedule: &Schedule, snapshot: &Snapshot, out: &mut Vec<Conflict>) {
    for block in snapshot.blocks() {
        for rotation in snapshot.rotations() {
            if rotation.required_per_block == 0 {
                continue;
            }
            let staffed = schedule.active_on_slot(&block.id, &rotation.id).len();
            if staffed < rotation.required_per_block as usize {
                out.push(
                    Conflict::new(
                        ConflictKind::CoverageShortfall,
                        format!(
                            "{}/{} staffed {} of {} required",
                            block.id, rotation.id, staffed, rotation.required_per_block
                        ),
                    )
                    .with_block(&block.id),
                );
            }
        }
    }
}
