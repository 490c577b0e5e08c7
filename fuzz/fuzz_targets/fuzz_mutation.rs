#![no_main]

use animats::evolution::{mutate, Genome, LengthBounds, MutationConfig};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Structured input for mutation fuzzing.
#[derive(Arbitrary, Debug)]
struct MutationInput {
    /// Seed genome (length capped to keep runs fast).
    nucleotides: Vec<u8>,
    /// Extra room below the seed length.
    below: u16,
    /// Extra room above the seed length.
    above: u16,
    /// Probabilities, scaled from 0..=255 to [0, 1].
    point: u8,
    duplication: u8,
    deletion: u8,
    /// Segment widths.
    min_width: u16,
    extra_width: u16,
    /// Number of successive mutations.
    rounds: u8,
    /// RNG seed.
    rng_seed: u64,
}

fuzz_target!(|input: MutationInput| {
    let mut nucleotides = input.nucleotides;
    nucleotides.truncate(4096);
    if nucleotides.is_empty() {
        return;
    }

    let len = nucleotides.len();
    let bounds = LengthBounds {
        min: len.saturating_sub(usize::from(input.below)).max(1),
        max: len + usize::from(input.above),
    };
    let Ok(mut genome) = Genome::new(nucleotides, bounds) else {
        return;
    };
    let min_width = usize::from(input.min_width).max(1);
    let config = MutationConfig {
        point_mutation_prob: f64::from(input.point) / 255.0,
        duplication_prob: f64::from(input.duplication) / 255.0,
        deletion_prob: f64::from(input.deletion) / 255.0,
        min_width,
        max_width: min_width + usize::from(input.extra_width),
        bounds,
    };

    let mut rng = ChaCha8Rng::seed_from_u64(input.rng_seed);
    for _ in 0..input.rounds.min(16) {
        genome = mutate(&genome, &config, &mut rng);
        assert!(bounds.contains(genome.len()), "mutation left bounds: {}", genome.len());
    }
});
