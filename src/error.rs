//! Error types for experiment validation, mutation bounds, evaluation and
//! run persistence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A primary experiment parameter is malformed or out of range.
///
/// Raised by [`crate::Experiment::derive`] before any simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// World width or height is zero.
    #[error("world dimensions must be positive (got {width}x{height})")]
    EmptyWorld {
        /// Configured world width.
        width: usize,
        /// Configured world height.
        height: usize,
    },
    /// World width or height exceeds the supported maximum.
    #[error("world dimensions {width}x{height} exceed the maximum of {max}")]
    WorldTooLarge {
        /// Configured world width.
        width: usize,
        /// Configured world height.
        height: usize,
        /// Largest supported dimension.
        max: usize,
    },
    /// A probability lies outside `[0, 1]` or is not finite.
    #[error("`{name}` must be a probability in [0, 1] (got {value})")]
    Probability {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A lower bound exceeds its upper bound.
    #[error("`{min_name}` ({min}) exceeds `{max_name}` ({max})")]
    InvertedBounds {
        /// Name of the lower bound.
        min_name: &'static str,
        /// Lower bound value.
        min: usize,
        /// Name of the upper bound.
        max_name: &'static str,
        /// Upper bound value.
        max: usize,
    },
    /// Genomes may never be empty.
    #[error("`min_genome_length` must be at least 1")]
    EmptyGenome,
    /// The seed genome does not satisfy the genome length bounds.
    #[error("initial genome length {length} lies outside [{min}, {max}]")]
    InitialGenomeLength {
        /// Length of the seed genome.
        length: usize,
        /// Minimum genome length.
        min: usize,
        /// Maximum genome length.
        max: usize,
    },
    /// Too many nodes to enumerate the state space.
    #[error("{num_nodes} nodes exceeds the maximum of {max}")]
    TooManyNodes {
        /// Total node count.
        num_nodes: usize,
        /// Largest supported node count.
        max: usize,
    },
    /// Population size is zero.
    #[error("population size must be positive")]
    EmptyPopulation,
    /// Natural fitness base must be positive and finite.
    #[error("`nat_fit_base` must be positive and finite (got {0})")]
    FitnessBase(f64),
    /// No task conditions were given.
    #[error("task has no conditions")]
    EmptyTask,
    /// Task patterns do not all have the same width.
    #[error("task pattern {index} has width {width}, expected {expected}")]
    InconsistentTask {
        /// Index of the offending condition.
        index: usize,
        /// Its width.
        width: usize,
        /// Width of the first pattern.
        expected: usize,
    },
    /// A task pattern contains something other than `1`, `0` or `_`.
    #[error("task pattern `{0}` may only contain '1', '0' and '_'")]
    InvalidPattern(String),
    /// A task pattern is empty, wider than the world, or wider than 64 cells.
    #[error("task pattern width {width} must be in [1, {max}]")]
    PatternWidth {
        /// Pattern width.
        width: usize,
        /// Largest allowed width.
        max: usize,
    },
    /// More trials than the task counters can hold.
    #[error("{num_trials} trials per evaluation exceeds the maximum of {max}")]
    TooManyTrials {
        /// Trials per evaluation.
        num_trials: usize,
        /// Largest supported trial count.
        max: u32,
    },
    /// A perfect score would overflow the natural fitness function.
    #[error("`nat_fit_base` {nat_fit_base} raised to {num_trials} trials is not a finite fitness")]
    FitnessOverflow {
        /// Natural fitness base.
        nat_fit_base: f64,
        /// Trials per evaluation.
        num_trials: usize,
    },
    /// An interval setting is zero.
    #[error("`{0}` must be positive")]
    ZeroInterval(&'static str),
}

/// A genome edit would break the genome length bounds.
///
/// Never fatal: the mutation engine skips the offending operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("edit would change genome length from {length} to {attempted}, outside [{min}, {max}]")]
pub struct BoundsViolation {
    /// Current genome length.
    pub length: usize,
    /// Length the edit would produce.
    pub attempted: usize,
    /// Minimum allowed length.
    pub min: usize,
    /// Maximum allowed length.
    pub max: usize,
}

/// The evaluation capability failed for a genome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The genome could not be developed into a phenotype.
    #[error("failed to develop phenotype: {0}")]
    Development(String),
    /// The evaluator produced a negative or non-finite fitness.
    #[error("invalid fitness {0}; fitness must be finite and non-negative")]
    InvalidFitness(f64),
}

/// Fatal error during an evolution run.
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Experiment or run settings failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An individual could not be evaluated.
    #[error("evaluation of individual {id} failed: {source}")]
    Evaluation {
        /// Id of the individual.
        id: u64,
        /// Underlying failure.
        #[source]
        source: EvaluationError,
    },
    /// Reading or writing a checkpoint failed.
    #[error("checkpoint I/O error at {}: {source}", .path.display())]
    CheckpointIo {
        /// Checkpoint path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// A checkpoint file is not in a format this version understands.
    #[error("invalid checkpoint {}: {reason}", .path.display())]
    CheckpointFormat {
        /// Checkpoint path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
    /// A checkpoint decoded cleanly but its contents contradict each other.
    #[error("inconsistent checkpoint: {0}")]
    InconsistentCheckpoint(String),
    /// Reading an experiment file failed.
    #[error("failed to read experiment file {}: {source}", .path.display())]
    ExperimentIo {
        /// File path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Reading or writing a run output file failed.
    #[error("output I/O error at {}: {source}", .path.display())]
    OutputIo {
        /// File path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// An experiment or output file is not valid JSON for its schema.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
    /// The output file exists and overwriting was not requested.
    #[error("output file {} already exists (pass --overwrite to replace it)", .0.display())]
    OutputExists(PathBuf),
}

/// Result type for evolution runs.
pub type EvolutionResult<T> = Result<T, EvolutionError>;
