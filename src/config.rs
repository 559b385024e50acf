//! Engine configuration.
//!
//! All tunables that the scheduling program may vary — duty-hour caps,
//! coverage risk thresholds, swap scoring weights, propagation budgets —
//! live here as data rather than constants at call sites, so different
//! programs can run the same engine with different policy.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Regulatory duty-hour parameters.
    pub duty_hours: DutyHourConfig,
    /// Fixpoint propagation budget.
    pub propagation: PropagationBudget,
    /// Coverage risk classification thresholds.
    pub coverage: RiskThresholds,
    /// Swap match scoring weights and execution threshold.
    pub swap: SwapWeights,
    /// Auto-resolver limits.
    pub resolver: ResolverConfig,
    /// Candidate weight penalties attached by absences.
    pub weights: WeightPenalties,
}

/// Duty-hour rule parameters (ACGME-style weekly ceiling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyHourConfig {
    /// Maximum averaged weekly duty hours.
    pub weekly_cap: u32,
    /// Cap reduction applied while a reduced-availability absence overlaps
    /// the block.
    pub reduced_hour_penalty: u32,
    /// Minimum nights between in-house call. Call more frequent than this
    /// leaves no compliant rest pattern.
    pub min_call_interval_nights: u32,
}

impl Default for DutyHourConfig {
    fn default() -> Self {
        Self {
            weekly_cap: 80,
            reduced_hour_penalty: 20,
            min_call_interval_nights: 3,
        }
    }
}

/// Iteration/time budget for the constraint propagator.
///
/// Exceeding the budget yields a partial result with feasibility `Unknown`,
/// not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationBudget {
    /// Maximum number of passes before giving up.
    pub max_iterations: u32,
    /// Optional wall-clock limit in milliseconds.
    pub max_elapsed_ms: Option<u64>,
}

impl Default for PropagationBudget {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            max_elapsed_ms: None,
        }
    }
}

/// Coverage risk band thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Available-to-required ratio at or above which a slot is `Adequate`.
    pub adequate_ratio: f64,
    /// Remaining-coverage ratio at or above which a contingency is merely
    /// `Degraded` rather than `Critical`.
    pub degraded_ratio: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            adequate_ratio: 1.5,
            degraded_ratio: 0.75,
        }
    }
}

/// Weighted scoring for swap matching.
///
/// Weights need not sum to 1; scores are compared relatively and the
/// confidence is normalized against the weight total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapWeights {
    /// Weight of the workload-fairness delta component.
    pub fairness: f64,
    /// Weight of the stated-preference (specialty interest) component.
    pub preference: f64,
    /// Weight of the schedule-proximity component.
    pub proximity: f64,
    /// Minimum confidence (0.0..1.0) for automatic execution.
    pub confidence_threshold: f64,
}

impl Default for SwapWeights {
    fn default() -> Self {
        Self {
            fairness: 0.5,
            preference: 0.3,
            proximity: 0.2,
            confidence_threshold: 0.75,
        }
    }
}

/// Auto-resolver limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Default bound on generated resolution options.
    pub max_options: usize,
    /// Maximum assignments a reassignment target may exceed the mean
    /// workload by, post-resolution.
    pub max_workload_delta: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_options: 5,
            max_workload_delta: 2,
        }
    }
}

/// Weight penalties attached to surviving candidates by absences.
///
/// Higher weight = less preferred. Penalties accumulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightPenalties {
    /// Penalty for a blocking absence overlapping a sessional rotation
    /// (missed sessions must be made up).
    pub blocking_sessional: f64,
    /// Penalty for a reduced-availability absence overlapping the block.
    pub reduced_availability: f64,
}

impl Default for WeightPenalties {
    fn default() -> Self {
        Self {
            blocking_sessional: 10.0,
            reduced_availability: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.duty_hours.weekly_cap, 80);
        assert_eq!(cfg.duty_hours.reduced_hour_penalty, 20);
        assert_eq!(cfg.propagation.max_iterations, 25);
        assert!(cfg.propagation.max_elapsed_ms.is_none());
        assert!((cfg.coverage.adequate_ratio - 1.5).abs() < 1e-10);
        assert!((cfg.swap.confidence_threshold - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_config_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolver.max_options, cfg.resolver.max_options);
        assert_eq!(back.duty_hours.weekly_cap, cfg.duty_hours.weekly_cap);
    }
}
