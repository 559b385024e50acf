//! Swap request matching.
//!
//! Matches pending swap requests against the current schedule. Candidates
//! first clear the same safety gates as conflict resolution, in both
//! directions for a one-to-one trade; survivors are scored on workload
//! fairness, stated preference, and schedule proximity, and only a match
//! above the configured confidence threshold executes automatically.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::conflicts::{is_safe, run_safety_checks, ResolutionStrategy};
use crate::error::EngineError;
use crate::models::{Schedule, Severity, Snapshot, SwapKind, SwapRequest, SwapStatus};
use crate::store::ScheduleStore;

/// A gate-cleared, scored candidate match for a swap request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// Request being matched.
    pub request_id: Uuid,
    /// Counterpart person.
    pub counterpart: String,
    /// Counterpart's assignment traded away; `None` for an absorb.
    pub counterpart_assignment_id: Option<String>,
    /// Requester's assignment being traded.
    pub assignment_id: String,
    /// Workload-fairness component, 0.0..1.0.
    pub fairness: f64,
    /// Stated-preference component, 0.0..1.0.
    pub preference: f64,
    /// Schedule-proximity component, 0.0..1.0.
    pub proximity: f64,
    /// Weighted overall confidence, 0.0..1.0.
    pub confidence: f64,
}

impl ScoredMatch {
    /// The store mutation this match corresponds to.
    pub fn strategy(&self) -> ResolutionStrategy {
        match &self.counterpart_assignment_id {
            Some(counterpart_id) => ResolutionStrategy::Swap {
                assignment_id: self.assignment_id.clone(),
                counterpart_id: counterpart_id.clone(),
            },
            None => ResolutionStrategy::Reassign {
                assignment_id: self.assignment_id.clone(),
                to_person: self.counterpart.clone(),
            },
        }
    }
}

/// Summary of an automatic matching sweep.
#[derive(Debug, Clone, Default)]
pub struct MatchSummary {
    /// Requests executed, with the match applied.
    pub executed: Vec<ScoredMatch>,
    /// Requests left pending: no candidate cleared the gates and the
    /// confidence threshold.
    pub still_pending: Vec<Uuid>,
}

/// A proposed (not executed) trade that would ease a soft conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveSuggestion {
    /// Person the suggestion relieves.
    pub person_id: String,
    /// What the underlying soft conflict is.
    pub reason: String,
    /// The trade to offer.
    pub strategy: ResolutionStrategy,
}

fn workload_fairness(counterpart: &str, schedule: &Schedule, snapshot: &Snapshot) -> f64 {
    let load = schedule.load_by_person();
    let people = snapshot.people().iter().filter(|p| p.active).count().max(1);
    let mean = schedule.active_count() as f64 / people as f64;
    let counterpart_load = load.get(counterpart).copied().unwrap_or(0) as f64;
    // Below-mean counterparts score toward 1, overloaded ones toward 0.
    (1.0 - (counterpart_load - mean) / (mean + 1.0)).clamp(0.0, 1.0)
}

fn preference_score(counterpart: &str, rotation_id: &str, snapshot: &Snapshot) -> f64 {
    let Some(person) = snapshot.person(counterpart) else {
        return 0.0;
    };
    let named = snapshot
        .rotation(rotation_id)
        .map(|r| person.has_specialty(&r.name))
        .unwrap_or(false);
    if person.has_specialty(rotation_id) || named {
        1.0
    } else {
        0.0
    }
}

fn proximity_score(
    counterpart: &str,
    block_id: &str,
    schedule: &Schedule,
    snapshot: &Snapshot,
) -> f64 {
    let Some(target) = snapshot.block_position(block_id) else {
        return 0.0;
    };
    schedule
        .active_for_person(counterpart)
        .iter()
        .filter(|a| a.block_id != block_id)
        .filter_map(|a| snapshot.block_position(&a.block_id))
        .map(|pos| 1.0 / (1.0 + pos.abs_diff(target) as f64))
        .fold(0.0, f64::max)
}

/// Scores and ranks every gate-clearing candidate for one request.
///
/// Results are ordered by confidence descending, counterpart ID ascending
/// on ties, and truncated to `limit`.
pub fn suggest_optimal_matches(
    request: &SwapRequest,
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
    limit: usize,
) -> Vec<ScoredMatch> {
    let Some(assignment) = schedule
        .active()
        .find(|a| {
            a.person_id == request.requester
                && a.block_id == request.block_id
                && a.rotation_id == request.rotation_id
        })
        .cloned()
    else {
        return Vec::new();
    };

    let mut candidates: Vec<(String, Option<String>)> = match request.kind {
        SwapKind::OneToOne => {
            let mut list: Vec<_> = schedule
                .active()
                .filter(|a| a.person_id != request.requester)
                .map(|a| (a.person_id.clone(), Some(a.id.clone())))
                .collect();
            list.sort();
            list
        }
        SwapKind::Absorb => {
            let mut list: Vec<_> = snapshot
                .people()
                .iter()
                .filter(|p| p.active && p.id != request.requester)
                .map(|p| (p.id.clone(), None))
                .collect();
            list.sort();
            list
        }
    };
    candidates.dedup();

    let weights = &config.swap;
    let weight_total = weights.fairness + weights.preference + weights.proximity;
    let mut matches = Vec::new();
    for (counterpart, counterpart_assignment_id) in candidates {
        let candidate = ScoredMatch {
            request_id: request.id,
            counterpart: counterpart.clone(),
            counterpart_assignment_id,
            assignment_id: assignment.id.clone(),
            fairness: 0.0,
            preference: 0.0,
            proximity: 0.0,
            confidence: 0.0,
        };
        // Symmetric validation: the gates assess both sides of a trade.
        if !is_safe(&run_safety_checks(
            &candidate.strategy(),
            schedule,
            snapshot,
            config,
        )) {
            continue;
        }
        let fairness = workload_fairness(&counterpart, schedule, snapshot);
        let preference = preference_score(&counterpart, &request.rotation_id, snapshot);
        let proximity = proximity_score(&counterpart, &request.block_id, schedule, snapshot);
        let confidence = (weights.fairness * fairness
            + weights.preference * preference
            + weights.proximity * proximity)
            / weight_total;
        matches.push(ScoredMatch {
            fairness,
            preference,
            proximity,
            confidence,
            ..candidate
        });
    }

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.counterpart.cmp(&b.counterpart))
    });
    matches.truncate(limit);
    matches
}

/// Executes a matched trade through the store.
fn execute_match(matched: &ScoredMatch, store: &mut ScheduleStore) -> Result<(), EngineError> {
    match matched.strategy() {
        ResolutionStrategy::Swap {
            assignment_id,
            counterpart_id,
        } => {
            let va = store
                .assignment(&assignment_id)
                .ok_or_else(|| EngineError::unknown("assignment", assignment_id.clone()))?
                .version;
            let vb = store
                .assignment(&counterpart_id)
                .ok_or_else(|| EngineError::unknown("assignment", counterpart_id.clone()))?
                .version;
            store.swap_persons(&assignment_id, va, &counterpart_id, vb)
        }
        ResolutionStrategy::Reassign {
            assignment_id,
            to_person,
        } => {
            let version = store
                .assignment(&assignment_id)
                .ok_or_else(|| EngineError::unknown("assignment", assignment_id.clone()))?
                .version;
            store.reassign(&assignment_id, &to_person, version)
        }
        ResolutionStrategy::CancelAndBackfill { .. } => unreachable!("matches never cancel"),
    }
}

/// Processes pending requests in submission order, executing each one's
/// best match when its confidence clears the configured threshold.
///
/// Matching is re-run against the schedule left by earlier executions, so
/// two requests can never trade away the same assignment.
///
/// # Errors
/// Propagates store version conflicts; earlier executions stay applied.
pub fn auto_match_pending(
    store: &mut ScheduleStore,
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<MatchSummary, EngineError> {
    let pending: Vec<SwapRequest> = store.pending_swaps().into_iter().cloned().collect();
    let mut summary = MatchSummary::default();

    for request in pending {
        let schedule = store.schedule();
        let best = suggest_optimal_matches(&request, &schedule, snapshot, config, 1)
            .into_iter()
            .next();
        match best {
            Some(matched) if matched.confidence >= config.swap.confidence_threshold => {
                // Two-step lifecycle: the request is marked matched first,
                // then the trade applies and it moves to executed.
                let id = request.id.to_string();
                let version = store
                    .swap(&id)
                    .map(|s| s.version)
                    .unwrap_or(request.version);
                store.set_swap_status(&id, SwapStatus::Matched, version)?;
                execute_match(&matched, store)?;
                let version = store
                    .swap(&id)
                    .map(|s| s.version)
                    .unwrap_or(request.version);
                store.set_swap_status(&id, SwapStatus::Executed, version)?;
                info!(
                    request = %request.id,
                    counterpart = %matched.counterpart,
                    confidence = matched.confidence,
                    "swap executed"
                );
                summary.executed.push(matched);
            }
            best => {
                debug!(
                    request = %request.id,
                    best_confidence = best.map(|m| m.confidence).unwrap_or(0.0),
                    "no match above threshold; request stays pending"
                );
                summary.still_pending.push(request.id);
            }
        }
    }
    Ok(summary)
}

/// Scans the committed schedule for soft conflicts and proposes trades
/// that would ease them, without executing any.
///
/// Hard conflicts are the resolver's business; the gate-clearing swap
/// repairs for the soft ones become suggestions a person can turn into a
/// real request. At most `limit` suggestions are returned.
pub fn suggest_proactive_swaps(
    schedule: &Schedule,
    snapshot: &Snapshot,
    config: &EngineConfig,
    limit: usize,
) -> Vec<ProactiveSuggestion> {
    let mut suggestions = Vec::new();
    let conflicts = crate::conflicts::detect(schedule, snapshot, config);
    for conflict in conflicts.iter().filter(|c| c.severity == Severity::Soft) {
        if suggestions.len() >= limit {
            break;
        }
        let Some(person_id) = conflict.person_id.clone() else {
            continue;
        };
        for option in crate::conflicts::generate_options(conflict, schedule, snapshot, config) {
            if suggestions.len() >= limit {
                break;
            }
            if matches!(option.strategy, ResolutionStrategy::Swap { .. }) {
                suggestions.push(ProactiveSuggestion {
                    person_id: person_id.clone(),
                    reason: conflict.detail.clone(),
                    strategy: option.strategy,
                });
            }
        }
    }
    suggestions
}
