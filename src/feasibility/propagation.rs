//! Batched fixpoint constraint propagation.
//!
//! Rules observe the domain as it stood at the start of the pass and
//! nominate candidates for elimination; the union of nominations is
//! applied once the pass completes. A rule therefore never sees another
//! rule's removals from the same pass, which keeps per-pass elimination
//! counts independent of rule order and lets removal cascades (a duty-hour
//! elimination stranding a supervision slot, say) surface as separate,
//! countable passes. The loop stops at the first empty pass or when the
//! budget runs out.
//!
//! # Reference
//! Mackworth, "Consistency in Networks of Relations",
//! Artificial Intelligence 8(1), 1977 — the AC-style propagate-to-fixpoint
//! loop, batched here per pass instead of per arc.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::debug;

use crate::config::{DutyHourConfig, PropagationBudget};
use crate::feasibility::domain::{CandidateDomain, CandidateKey};
use crate::models::Snapshot;

/// Everything a rule may consult during a pass.
pub struct RuleContext<'a> {
    /// Run input.
    pub snapshot: &'a Snapshot,
    /// Duty-hour parameters.
    pub duty_hours: &'a DutyHourConfig,
    /// Domain as of the start of the current pass.
    pub domain: &'a CandidateDomain,
}

/// A propagation rule.
///
/// Rules are pure observers: they nominate eliminations against the
/// pass-start domain and never mutate anything themselves.
pub trait PropagationRule {
    /// Stable rule name, used in pass logs.
    fn name(&self) -> &'static str;

    /// Candidates this rule eliminates given the pass-start domain.
    fn eliminations(&self, ctx: &RuleContext<'_>) -> Vec<CandidateKey>;
}

/// Weekly duty-hour ceiling (highest priority).
///
/// A candidate is eliminated when its rotation's averaged weekly hours
/// exceed the person's cap for that block. The cap is the configured
/// ceiling, lowered by the reduced-hour penalty while a
/// reduced-availability absence overlaps the block.
pub struct DutyHourRule;

impl PropagationRule for DutyHourRule {
    fn name(&self) -> &'static str {
        "duty-hours"
    }

    fn eliminations(&self, ctx: &RuleContext<'_>) -> Vec<CandidateKey> {
        let mut out = Vec::new();
        for (key, _) in ctx.domain.iter() {
            let Some(rotation) = ctx.snapshot.rotation(&key.rotation_id) else {
                continue;
            };
            let Some(block) = ctx.snapshot.block(&key.block_id) else {
                continue;
            };
            let mut cap = ctx.duty_hours.weekly_cap;
            if ctx.snapshot.is_reduced(&key.person_id, block) {
                cap = cap.saturating_sub(ctx.duty_hours.reduced_hour_penalty);
            }
            if rotation.avg_weekly_hours > cap {
                out.push(key.clone());
            }
        }
        out
    }
}

/// On-site supervision requirement (second priority).
///
/// A resident candidate on a supervision-required rotation is eliminated
/// when no faculty candidate remains on the same (block, rotation) slot in
/// the pass-start domain. Faculty candidates are never eliminated here.
pub struct SupervisionRule;

impl PropagationRule for SupervisionRule {
    fn name(&self) -> &'static str {
        "supervision"
    }

    fn eliminations(&self, ctx: &RuleContext<'_>) -> Vec<CandidateKey> {
        let mut out = Vec::new();
        for rotation in ctx.snapshot.rotations() {
            if !rotation.requires_supervision() {
                continue;
            }
            for block in ctx.snapshot.blocks() {
                let has_faculty = ctx.domain.on_slot(&block.id, &rotation.id).any(|k| {
                    ctx.snapshot
                        .person(&k.person_id)
                        .map(|p| p.is_faculty())
                        .unwrap_or(false)
                });
                if has_faculty {
                    continue;
                }
                out.extend(
                    ctx.domain
                        .on_slot(&block.id, &rotation.id)
                        .filter(|k| {
                            ctx.snapshot
                                .person(&k.person_id)
                                .map(|p| p.is_resident())
                                .unwrap_or(false)
                        })
                        .cloned(),
                );
            }
        }
        out
    }
}

/// Minimum rest between calls (third priority).
///
/// A resident candidate is eliminated when the rotation's call pattern
/// repeats more often than the configured minimum interval allows, since
/// no compliant rest arrangement exists for it.
pub struct RestRule;

impl PropagationRule for RestRule {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn eliminations(&self, ctx: &RuleContext<'_>) -> Vec<CandidateKey> {
        let mut out = Vec::new();
        for (key, _) in ctx.domain.iter() {
            let Some(rotation) = ctx.snapshot.rotation(&key.rotation_id) else {
                continue;
            };
            let Some(interval) = rotation.call_frequency.interval_nights() else {
                continue;
            };
            let is_resident = ctx
                .snapshot
                .person(&key.person_id)
                .map(|p| p.is_resident())
                .unwrap_or(false);
            if is_resident && interval < ctx.duty_hours.min_call_interval_nights {
                out.push(key.clone());
            }
        }
        out
    }
}

/// Outcome of a propagation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Passes executed, including the final empty one on convergence.
    pub iterations: u32,
    /// Candidates eliminated per pass.
    pub eliminations_per_pass: Vec<usize>,
    /// False when the budget ran out before a fixpoint.
    pub converged: bool,
}

impl PropagationOutcome {
    /// Total candidates eliminated across all passes.
    pub fn total_eliminated(&self) -> usize {
        self.eliminations_per_pass.iter().sum()
    }
}

/// Batched-pass fixpoint propagator.
pub struct Propagator {
    rules: Vec<Box<dyn PropagationRule>>,
}

impl Default for Propagator {
    /// The standard rule set, in priority order: duty hours, supervision,
    /// rest.
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(DutyHourRule),
                Box::new(SupervisionRule),
                Box::new(RestRule),
            ],
        }
    }
}

impl Propagator {
    /// Creates a propagator with a custom rule set.
    pub fn with_rules(rules: Vec<Box<dyn PropagationRule>>) -> Self {
        Self { rules }
    }

    /// Runs passes until a pass eliminates nothing or the budget is spent.
    pub fn run(
        &self,
        domain: &mut CandidateDomain,
        snapshot: &Snapshot,
        duty_hours: &DutyHourConfig,
        budget: &PropagationBudget,
    ) -> PropagationOutcome {
        let started = Instant::now();
        let mut eliminations_per_pass = Vec::new();
        let mut iterations = 0;

        loop {
            if iterations >= budget.max_iterations {
                debug!(iterations, "propagation iteration budget exhausted");
                return PropagationOutcome {
                    iterations,
                    eliminations_per_pass,
                    converged: false,
                };
            }
            if let Some(limit_ms) = budget.max_elapsed_ms {
                if started.elapsed().as_millis() as u64 > limit_ms {
                    debug!(iterations, "propagation time budget exhausted");
                    return PropagationOutcome {
                        iterations,
                        eliminations_per_pass,
                        converged: false,
                    };
                }
            }
            iterations += 1;

            // Rules all observe the pass-start domain; removals are unioned
            // and applied together below.
            let mut nominated: BTreeSet<CandidateKey> = BTreeSet::new();
            for rule in &self.rules {
                let ctx = RuleContext {
                    snapshot,
                    duty_hours,
                    domain,
                };
                let eliminations = rule.eliminations(&ctx);
                debug!(
                    pass = iterations,
                    rule = rule.name(),
                    nominated = eliminations.len(),
                    "propagation rule evaluated"
                );
                nominated.extend(eliminations);
            }

            let mut removed = 0;
            for key in &nominated {
                if domain.remove(key) {
                    removed += 1;
                }
            }
            eliminations_per_pass.push(removed);
            debug!(
                pass = iterations,
                removed,
                remaining = domain.len(),
                "propagation pass applied"
            );

            if removed == 0 {
                return PropagationOutcome {
                    iterations,
                    eliminations_per_pass,
                    converged: true,
                };
            }
        }
    }
}
