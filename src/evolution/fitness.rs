//! Fitness evaluation.
//!
//! Evaluation is an external capability: an [`Evaluator`] develops a genome
//! into a phenotype and scores it against the experiment's task. Evaluators
//! must be pure, so the same genome under the same experiment always gets
//! the same [`Evaluation`], and must be `Sync` because a generation is
//! evaluated in parallel.
//!
//! [`LookupEvaluator`] is a reference implementation whose phenotype is a
//! plain response table read from the genome. It exercises the full
//! pipeline without a brain model and is what the command-line tool uses.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::evolution::genome::Genome;
use crate::experiment::Experiment;

/// Task performance counters for one individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Trials handled correctly.
    pub correct: u32,
    /// Trials handled incorrectly.
    pub incorrect: u32,
}

/// Result of evaluating one genome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fitness score (finite, non-negative).
    pub fitness: f64,
    /// Task performance counters.
    pub counters: Counters,
}

impl Evaluation {
    /// Check the evaluation contract.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidFitness`] if the fitness is
    /// negative or not finite.
    pub fn validate(self) -> Result<Self, EvaluationError> {
        if self.fitness.is_finite() && self.fitness >= 0.0 {
            Ok(self)
        } else {
            Err(EvaluationError::InvalidFitness(self.fitness))
        }
    }
}

/// Maps task performance counters to a fitness score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitnessFunction {
    /// `nat_fit_base ^ correct`: exponential in the number of correct trials.
    #[default]
    Natural,
    /// The number of correct trials.
    Linear,
}

impl FitnessFunction {
    /// Every available fitness function.
    pub const ALL: [Self; 2] = [Self::Natural, Self::Linear];

    /// Command-line name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Linear => "linear",
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Natural => "nat_fit_base raised to the number of correct trials",
            Self::Linear => "the number of correct trials",
        }
    }

    /// Fitness for the given counters.
    #[must_use]
    pub fn apply(self, counters: Counters, nat_fit_base: f64) -> f64 {
        match self {
            Self::Natural => nat_fit_base.powf(f64::from(counters.correct)),
            Self::Linear => f64::from(counters.correct),
        }
    }
}

/// The external evaluation capability.
pub trait Evaluator: Sync {
    /// Phenotype built from a genome.
    type Phenotype;

    /// Build the phenotype for `genome`.
    ///
    /// # Errors
    ///
    /// Returns an error if the genome cannot be developed.
    fn develop(
        &self,
        genome: &Genome,
        experiment: &Experiment,
    ) -> Result<Self::Phenotype, EvaluationError>;

    /// Score a phenotype against the experiment's task.
    ///
    /// # Errors
    ///
    /// Returns an error if the phenotype cannot be scored.
    fn evaluate(
        &self,
        phenotype: &Self::Phenotype,
        experiment: &Experiment,
    ) -> Result<Evaluation, EvaluationError>;

    /// Develop and score `genome`, checking the evaluation contract.
    ///
    /// # Errors
    ///
    /// Returns an error if development or scoring fails or the fitness is
    /// negative or not finite.
    fn evaluate_genome(
        &self,
        genome: &Genome,
        experiment: &Experiment,
    ) -> Result<Evaluation, EvaluationError> {
        let phenotype = self.develop(genome, experiment)?;
        self.evaluate(&phenotype, experiment)?.validate()
    }
}

/// Reference evaluator: trial `t` is answered by the low bit of nucleotide
/// `t mod len` (1 = catch, 0 = avoid), and is correct when the answer
/// matches the sign of the trial's hit multiplier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupEvaluator;

/// Phenotype of a [`LookupEvaluator`]: one catch/avoid response per trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTable {
    catches: Vec<bool>,
}

impl ResponseTable {
    /// Whether the animat catches in trial `trial`.
    #[must_use]
    pub fn catches(&self, trial: usize) -> bool {
        self.catches[trial]
    }
}

impl Evaluator for LookupEvaluator {
    type Phenotype = ResponseTable;

    fn develop(
        &self,
        genome: &Genome,
        experiment: &Experiment,
    ) -> Result<ResponseTable, EvaluationError> {
        if genome.is_empty() {
            return Err(EvaluationError::Development("empty genome".to_string()));
        }
        let nucleotides = genome.nucleotides();
        let catches = (0..experiment.num_trials())
            .map(|trial| nucleotides[trial % nucleotides.len()] & 1 == 1)
            .collect();
        Ok(ResponseTable { catches })
    }

    fn evaluate(
        &self,
        phenotype: &ResponseTable,
        experiment: &Experiment,
    ) -> Result<Evaluation, EvaluationError> {
        // Trials are grouped by task: both directions at every start position.
        let trials_per_task = 2 * experiment.params().world_width;
        let mut counters = Counters::default();
        for (task, &multiplier) in experiment.hit_multipliers().iter().enumerate() {
            let should_catch = multiplier > 0;
            for trial in task * trials_per_task..(task + 1) * trials_per_task {
                if phenotype.catches(trial) == should_catch {
                    counters.correct += 1;
                } else {
                    counters.incorrect += 1;
                }
            }
        }
        let params = experiment.params();
        Ok(Evaluation {
            fitness: params.fitness_function.apply(counters, params.nat_fit_base),
            counters,
        })
    }
}
