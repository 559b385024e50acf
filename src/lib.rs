//! Rotation scheduling engine for residency and faculty programs.
//!
//! Provides the feasibility, conflict, swap, and resilience machinery
//! around a committed block schedule. Assignment optimization itself is
//! out of scope — this crate decides whether a roster *can* work, keeps a
//! committed one healthy, and predicts how it fails.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Person`, `Block`, `Rotation`, `Absence`,
//!   `Assignment`, `Conflict`, `SwapRequest`, `Snapshot`
//! - **`validation`**: Input integrity checks (duplicate IDs, dangling
//!   references, inverted ranges)
//! - **`config`**: Policy tunables — duty-hour caps, risk thresholds,
//!   scoring weights, budgets
//! - **`store`**: Versioned assignment/conflict/swap storage with
//!   optimistic concurrency
//! - **`feasibility`**: Staged candidate-domain reduction and the
//!   coverage verdict
//! - **`conflicts`**: Violation detection and safety-gated resolution
//! - **`swaps`**: Swap request matching and scoring
//! - **`resilience`**: N-1/N-2 contingency simulation
//!
//! # References
//!
//! - Mackworth (1977), "Consistency in Networks of Relations"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - ACGME Common Program Requirements (duty-hour standards)

pub mod config;
pub mod conflicts;
pub mod error;
pub mod feasibility;
pub mod models;
pub mod resilience;
pub mod store;
pub mod swaps;
pub mod validation;

pub use config::EngineConfig;
pub use error::EngineError;
