// Allow unwrap and lossy casts in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation))]
//! Animats: a deterministic, resumable genetic algorithm for evolving
//! animats, small agents whose byte-string genomes encode their brains.
//!
//! This crate provides:
//! - Validated experiment configuration with its derived state space
//! - Point, duplication and deletion mutation under genome length bounds
//! - Roulette selection, a hall of fame and per-generation logbooks
//! - A generation scheduler with parallel evaluation and checkpoints
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     CLI (run / resume / example)    │
//! ├─────────────────────────────────────┤
//! │        Evolution (scheduler)        │
//! ├─────────────────────────────────────┤
//! │   Experiment (params + state space) │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod evolution;
pub mod experiment;

pub use error::{BoundsViolation, EvaluationError, EvolutionError, EvolutionResult, ValidationError};

// Re-export key types at crate root for convenience
pub use evolution::{
    Evaluator, Evolution, Genome, Individual, IndividualId, LookupEvaluator, RunOutput, RunSettings,
};
pub use experiment::{Experiment, ExperimentParams, TaskCondition};
