//! Mutation operators.
//!
//! Three operators are applied in a fixed order: point mutation, segmental
//! duplication, segmental deletion. Each is gated by its own probability.
//! A structural operator whose result would leave the genome length bounds
//! is skipped for that genome; it is never retried or clamped.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BoundsViolation;
use crate::evolution::genome::{Genome, LengthBounds};
use crate::experiment::Experiment;

/// Configuration for mutation operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of replacing each nucleotide.
    pub point_mutation_prob: f64,
    /// Probability of duplicating a segment.
    pub duplication_prob: f64,
    /// Probability of deleting a segment.
    pub deletion_prob: f64,
    /// Minimum segment width.
    pub min_width: usize,
    /// Maximum segment width.
    pub max_width: usize,
    /// Genome length bounds.
    pub bounds: LengthBounds,
}

impl From<&Experiment> for MutationConfig {
    fn from(experiment: &Experiment) -> Self {
        let params = experiment.params();
        Self {
            point_mutation_prob: params.mutation_prob,
            duplication_prob: params.duplication_prob,
            deletion_prob: params.deletion_prob,
            min_width: params.min_dup_del_width,
            max_width: params.max_dup_del_width,
            bounds: experiment.genome_bounds(),
        }
    }
}

/// Mutate a copy of `genome`: point mutation, then duplication, then
/// deletion.
#[must_use]
pub fn mutate<R: Rng>(genome: &Genome, config: &MutationConfig, rng: &mut R) -> Genome {
    let genome = point_mutate(genome, config.point_mutation_prob, rng);
    let genome = duplicate(
        &genome,
        config.duplication_prob,
        config.min_width,
        config.max_width,
        config.bounds,
        rng,
    );
    delete(
        &genome,
        config.deletion_prob,
        config.min_width,
        config.max_width,
        config.bounds,
        rng,
    )
}

/// Replace each nucleotide with a uniformly random one with probability
/// `prob`.
#[must_use]
pub fn point_mutate<R: Rng>(genome: &Genome, prob: f64, rng: &mut R) -> Genome {
    let mut mutant = genome.clone();
    for locus in mutant.loci_mut() {
        if rng.gen_bool(prob) {
            *locus = rng.r#gen();
        }
    }
    mutant
}

/// With probability `prob`, copy a random segment and insert it at a random
/// position. Skipped if the result would exceed `bounds.max`.
#[must_use]
pub fn duplicate<R: Rng>(
    genome: &Genome,
    prob: f64,
    min_width: usize,
    max_width: usize,
    bounds: LengthBounds,
    rng: &mut R,
) -> Genome {
    let mut mutant = genome.clone();
    if rng.gen_bool(prob) {
        let (start, width) = random_segment(genome.len(), min_width, max_width, rng);
        let insert_at = rng.gen_range(0..=genome.len());
        let segment = genome.segment(start..start + width);
        skip_on_violation("duplication", mutant.insert_segment(insert_at, &segment, bounds));
    }
    mutant
}

/// With probability `prob`, remove a random segment. Skipped if the result
/// would fall below `bounds.min`.
#[must_use]
pub fn delete<R: Rng>(
    genome: &Genome,
    prob: f64,
    min_width: usize,
    max_width: usize,
    bounds: LengthBounds,
    rng: &mut R,
) -> Genome {
    let mut mutant = genome.clone();
    if rng.gen_bool(prob) {
        let (start, width) = random_segment(genome.len(), min_width, max_width, rng);
        skip_on_violation("deletion", mutant.remove_segment(start..start + width, bounds));
    }
    mutant
}

/// Pick a segment width in `[min_width, max_width]`, clamped to `length`,
/// and a start offset that keeps the segment inside the genome.
fn random_segment<R: Rng>(
    length: usize,
    min_width: usize,
    max_width: usize,
    rng: &mut R,
) -> (usize, usize) {
    let width = rng.gen_range(min_width..=max_width).min(length);
    let start = rng.gen_range(0..=length - width);
    (start, width)
}

fn skip_on_violation(operator: &str, result: Result<(), BoundsViolation>) {
    if let Err(violation) = result {
        log::trace!("skipping {operator}: {violation}");
    }
}
