//! Feasibility pipeline.
//!
//! Answers one question before any optimizer runs: given the people,
//! blocks, rotations, and approved absences, can every rotation's minimum
//! staffing be met? The pipeline reduces the candidate domain in staged,
//! counted phases:
//!
//! 1. [`domain::seed_domain`] — full availability grid
//! 2. [`domain::apply_absences`] — blocking absences eliminate, sessional
//!    and reduced overlaps penalize
//! 3. [`eligibility::reduce`] — PGY floor, certifications, activity role
//! 4. [`propagation::Propagator`] — duty hours, supervision, rest to
//!    fixpoint
//! 5. [`coverage::assess`] — per-slot risk bands and the verdict
//!
//! Every phase reports how many candidates it removed, so an infeasible
//! answer comes with the trail of where the capacity went.

pub mod coverage;
pub mod domain;
pub mod eligibility;
pub mod propagation;

use tracing::info;

pub use coverage::{CoverageReport, RiskBand, SlotCoverage};
pub use domain::{CandidateDomain, CandidateKey};
pub use eligibility::EligibilityCounters;
pub use propagation::{
    DutyHourRule, PropagationOutcome, PropagationRule, Propagator, RestRule, RuleContext,
    SupervisionRule,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::Snapshot;
use crate::validation::validate_snapshot;

/// The feasibility verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// Every slot can be staffed.
    Yes,
    /// At least one slot cannot be staffed.
    No,
    /// Propagation ran out of budget; the domain is partially reduced and
    /// the coverage figures are upper bounds.
    Unknown,
}

/// Staged result of a feasibility run.
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    /// Candidates in the seeded grid.
    pub seeded: usize,
    /// Candidates after absence filtering.
    pub after_absences: usize,
    /// Per-predicate eligibility removals.
    pub eligibility: EligibilityCounters,
    /// Candidates after eligibility reduction.
    pub after_eligibility: usize,
    /// Propagation passes and per-pass eliminations.
    pub propagation: PropagationOutcome,
    /// Candidates at the propagation fixpoint (or budget stop).
    pub after_propagation: usize,
    /// Per-slot coverage.
    pub coverage: CoverageReport,
    /// Overall verdict.
    pub verdict: Feasibility,
    /// The reduced domain, for downstream analyzers.
    pub domain: CandidateDomain,
}

/// Runs the full feasibility pipeline over a validated snapshot.
///
/// # Errors
/// [`EngineError::InvalidSnapshot`] when the input fails integrity
/// validation. Infeasibility and budget exhaustion are verdicts, not
/// errors.
pub fn run(snapshot: &Snapshot, config: &EngineConfig) -> Result<FeasibilityReport, EngineError> {
    if let Err(errors) = validate_snapshot(snapshot) {
        return Err(EngineError::InvalidSnapshot(errors.len()));
    }

    let mut domain = domain::seed_domain(snapshot);
    let seeded = domain.len();

    domain::apply_absences(&mut domain, snapshot, &config.weights);
    let after_absences = domain.len();

    let eligibility = eligibility::reduce(&mut domain, snapshot);
    let after_eligibility = domain.len();

    let propagation = Propagator::default().run(
        &mut domain,
        snapshot,
        &config.duty_hours,
        &config.propagation,
    );
    let after_propagation = domain.len();

    let coverage = coverage::assess(&domain, snapshot, &config.coverage);

    let verdict = if !propagation.converged {
        Feasibility::Unknown
    } else if coverage.all_feasible() {
        Feasibility::Yes
    } else {
        Feasibility::No
    };

    info!(
        seeded,
        after_absences,
        after_eligibility,
        after_propagation,
        passes = propagation.iterations,
        ?verdict,
        "feasibility run complete"
    );

    Ok(FeasibilityReport {
        seeded,
        after_absences,
        eligibility,
        after_eligibility,
        propagation,
        after_propagation,
        coverage,
        verdict,
        domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Absence, ActivityType, Block, CallFrequency, Person, Rotation, Snapshot,
    };
    use chrono::{Duration, NaiveDate};

    fn blocks_13() -> Vec<Block> {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        (0..13i64)
            .map(|i| {
                let s = start + Duration::days(28 * i);
                Block::new(format!("B{:02}", i + 1), s, s + Duration::days(27))
            })
            .collect()
    }

    /// Blocking absence spanning blocks `from..=to` (1-based).
    fn blocking(blocks: &[Block], person: &str, from: usize, to: usize) -> Absence {
        Absence::blocking(person, blocks[from - 1].start, blocks[to - 1].end)
    }

    /// Reduced-availability absence spanning blocks `from..=to` (1-based).
    fn reduced(blocks: &[Block], person: &str, from: usize, to: usize) -> Absence {
        Absence::reduced(person, blocks[from - 1].start, blocks[to - 1].end)
    }

    /// A full residency program: 30 residents across three PGY years, six
    /// faculty, a 13-block year, and 18 rotations. Deliberately loses all
    /// its ICU supervisors late in the year.
    fn program_snapshot() -> Snapshot {
        let mut people = Vec::new();
        for i in 1..=10 {
            people.push(Person::resident(format!("R{i:02}"), 1).with_certification("BLS"));
        }
        for i in 11..=30 {
            let pgy = if i <= 20 { 2 } else { 3 };
            people.push(
                Person::resident(format!("R{i:02}"), pgy)
                    .with_certification("BLS")
                    .with_certification("ACLS"),
            );
        }
        for i in 1..=6 {
            people.push(
                Person::faculty(format!("F{i:02}"))
                    .with_certification("BLS")
                    .with_certification("ACLS"),
            );
        }

        let blocks = blocks_13();

        let mut rotations = Vec::new();
        for i in 1..=2 {
            rotations.push(
                Rotation::new(format!("r{i:02}"), ActivityType::InpatientCore)
                    .with_min_pgy(2)
                    .with_weekly_hours(70)
                    .with_call(CallFrequency::Q3)
                    .with_required_per_block(1),
            );
        }
        for i in 3..=6 {
            rotations.push(
                Rotation::new(format!("r{i:02}"), ActivityType::InpatientCore)
                    .with_min_pgy(2)
                    .with_weekly_hours(60)
                    .with_required_per_block(1),
            );
        }
        for i in 7..=8 {
            rotations.push(
                Rotation::new(format!("r{i:02}"), ActivityType::InpatientCore)
                    .with_min_pgy(3)
                    .with_weekly_hours(70)
                    .with_call(CallFrequency::Q3)
                    .with_required_per_block(1),
            );
        }
        for i in 9..=10 {
            rotations.push(
                Rotation::new(format!("r{i:02}"), ActivityType::InpatientCore)
                    .with_min_pgy(3)
                    .with_weekly_hours(60)
                    .with_required_per_block(1),
            );
        }
        for i in 11..=14 {
            rotations.push(
                Rotation::new(format!("r{i:02}"), ActivityType::AcuteCare)
                    .with_certification("ACLS")
                    .with_weekly_hours(55)
                    .with_supervision(0.25)
                    .with_required_per_block(1),
            );
        }
        rotations.push(
            Rotation::new("r15", ActivityType::AcuteCare)
                .with_weekly_hours(70)
                .with_supervision(0.25)
                .with_required_per_block(1),
        );
        rotations.push(
            Rotation::new("r16", ActivityType::AcuteCare)
                .with_weekly_hours(70)
                .with_required_per_block(1),
        );
        rotations.push(
            Rotation::new("r17", ActivityType::Clinic)
                .with_weekly_hours(40)
                .with_required_per_block(1),
        );
        rotations.push(
            Rotation::new("r18", ActivityType::Elective)
                .with_weekly_hours(40)
                .with_required_per_block(1),
        );

        let mut absences = Vec::new();
        // Senior residents away on research or parental leave.
        for r in ["R21", "R22"] {
            absences.push(blocking(&blocks, r, 1, 7));
            absences.push(blocking(&blocks, r, 8, 13));
        }
        for r in ["R23", "R24", "R25", "R26"] {
            absences.push(blocking(&blocks, r, 1, 7));
        }
        for r in ["R27", "R28", "R29", "R30"] {
            absences.push(blocking(&blocks, r, 8, 13));
        }
        // Part-time and external-commitment periods.
        for r in ["R01", "R02", "R03", "R04", "R05", "R06", "R07", "R08"] {
            absences.push(reduced(&blocks, r, 1, 2));
        }
        absences.push(reduced(&blocks, "R09", 3, 5));
        absences.push(reduced(&blocks, "R10", 10, 12));
        absences.push(reduced(&blocks, "R11", 10, 13));
        absences.push(reduced(&blocks, "R11", 1, 4));
        absences.push(reduced(&blocks, "R11", 5, 8));
        for r in ["R12", "R13", "R14", "R15", "R16", "R17", "R18"] {
            absences.push(reduced(&blocks, r, 1, 5));
            absences.push(reduced(&blocks, r, 6, 9));
        }
        for b in [1, 3, 5] {
            absences.push(reduced(&blocks, "R19", b, b));
        }
        for b in [1, 3] {
            absences.push(reduced(&blocks, "R20", b, b));
        }
        // Every ICU attending drops to reduced availability at year end.
        for i in 1..=6 {
            absences.push(reduced(&blocks, &format!("F{i:02}"), 10, 13));
        }

        Snapshot::new(people, blocks, rotations, absences)
    }

    #[test]
    fn test_full_program_pipeline() {
        let snapshot = program_snapshot();
        let report = run(&snapshot, &EngineConfig::default()).unwrap();

        // 36 people x 13 blocks x 18 rotations.
        assert_eq!(report.seeded, 8424);
        // 78 blocked person-blocks x 16 full-presence rotations.
        assert_eq!(report.after_absences, 7176);
        // PGY1 barred from r01-r10, PGY2 from r07-r10.
        assert_eq!(report.eligibility.pgy_level, 1820);
        // PGY1 lack ACLS for r11-r14.
        assert_eq!(report.eligibility.certification, 520);
        // Faculty cannot take resident-only ward services.
        assert_eq!(report.eligibility.activity_role, 780);
        assert_eq!(report.after_eligibility, 4056);

        // Pass 1: reduced-availability duty-hour cap (80 -> 60) knocks out
        // every >60h candidate for people in reduced periods. Pass 2: with
        // all six attendings gone from the late-year ICU slots, the
        // stranded resident candidates follow. Pass 3 confirms.
        assert!(report.propagation.converged);
        assert_eq!(report.propagation.iterations, 3);
        assert_eq!(report.propagation.eliminations_per_pass, vec![412, 89, 0]);
        assert_eq!(report.after_propagation, 3555);

        // The four supervisorless ICU slots are the only gaps.
        let infeasible: Vec<_> = report.coverage.infeasible().collect();
        assert_eq!(infeasible.len(), 4);
        for slot in &infeasible {
            assert_eq!(slot.rotation_id, "r15");
        }
        let blocks: Vec<_> = infeasible.iter().map(|s| s.block_id.as_str()).collect();
        assert_eq!(blocks, vec!["B10", "B11", "B12", "B13"]);
        assert_eq!(report.verdict, Feasibility::No);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let snapshot = program_snapshot();
        let a = run(&snapshot, &EngineConfig::default()).unwrap();
        let b = run(&snapshot, &EngineConfig::default()).unwrap();
        assert_eq!(a.after_propagation, b.after_propagation);
        assert_eq!(
            a.propagation.eliminations_per_pass,
            b.propagation.eliminations_per_pass
        );
        assert_eq!(a.coverage, b.coverage);
    }

    #[test]
    fn test_small_feasible_program() {
        let blocks = blocks_13();
        let snapshot = Snapshot::new(
            vec![
                Person::resident("R01", 2).with_certification("ACLS"),
                Person::resident("R02", 2).with_certification("ACLS"),
                Person::faculty("F01").with_certification("ACLS"),
            ],
            blocks,
            vec![
                Rotation::new("wards", ActivityType::InpatientCore)
                    .with_min_pgy(2)
                    .with_weekly_hours(60)
                    .with_required_per_block(1),
                Rotation::new("icu", ActivityType::AcuteCare)
                    .with_weekly_hours(70)
                    .with_supervision(0.25)
                    .with_required_per_block(1),
            ],
            vec![],
        );
        let report = run(&snapshot, &EngineConfig::default()).unwrap();
        assert_eq!(report.verdict, Feasibility::Yes);
        assert!(report.coverage.all_feasible());
    }

    #[test]
    fn test_budget_exhaustion_yields_unknown() {
        let snapshot = program_snapshot();
        let mut config = EngineConfig::default();
        config.propagation.max_iterations = 1;
        let report = run(&snapshot, &config).unwrap();
        assert_eq!(report.verdict, Feasibility::Unknown);
        assert!(!report.propagation.converged);
        // The single pass still ran and was counted.
        assert_eq!(report.propagation.eliminations_per_pass, vec![412]);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let snapshot = Snapshot::new(
            vec![Person::resident("R01", 1), Person::resident("R01", 1)],
            vec![],
            vec![],
            vec![],
        );
        let err = run(&snapshot, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSnapshot(1)));
    }
}
