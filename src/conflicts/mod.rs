//! Conflict detection and resolution.
//!
//! [`detector`] walks a committed schedule and reports every rule
//! violation as an open [`Conflict`](crate::models::Conflict);
//! [`resolver`] proposes graded repairs and applies them only behind the
//! safety gates, escalating to a human whenever no safe repair exists.

pub mod detector;
pub mod resolver;

pub use detector::detect;
pub use resolver::{
    auto_resolve, auto_resolve_if_safe, batch_auto_resolve, batch_auto_resolve_open,
    generate_options, is_safe, run_safety_checks, AutoResolveOutcome, BatchSummary,
    ResolutionOption, ResolutionStrategy, RiskLevel, SafetyCheck, SafetyGate,
};
