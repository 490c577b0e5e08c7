//! Property-based tests for genomes, mutation, selection and ancestry.
//!
//! These tests verify the bounds and bookkeeping invariants of the
//! evolutionary operators.
//! Run with: cargo test --release prop_genome

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use animats::evolution::{
    delete, duplicate, mutate, point_mutate, select_roulette, Genome, HallOfFame, IndividualId,
    LengthBounds, MutationConfig, Pedigree,
};

/// A genome length strictly inside generous bounds, plus the bounds.
fn genome_and_bounds() -> impl Strategy<Value = (Vec<u8>, LengthBounds)> {
    (1usize..64, 0usize..64, 0usize..64).prop_flat_map(|(min, slack, headroom)| {
        let bounds = LengthBounds {
            min,
            max: min + slack + headroom,
        };
        (prop::collection::vec(any::<u8>(), min..=min + slack), Just(bounds))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Mutation never leaves the genome length bounds.
    #[test]
    fn prop_mutate_respects_bounds(
        (nucleotides, bounds) in genome_and_bounds(),
        point in 0.0f64..=1.0,
        dup in 0.0f64..=1.0,
        del in 0.0f64..=1.0,
        min_width in 1usize..16,
        extra_width in 0usize..32,
        seed in any::<u64>()
    ) {
        let genome = Genome::new(nucleotides, bounds).unwrap();
        let config = MutationConfig {
            point_mutation_prob: point,
            duplication_prob: dup,
            deletion_prob: del,
            min_width,
            max_width: min_width + extra_width,
            bounds,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mutant = mutate(&genome, &config, &mut rng);
        prop_assert!(bounds.contains(mutant.len()));
        prop_assert!(!mutant.is_empty());
    }

    /// Point mutation only ever changes values, never length.
    #[test]
    fn prop_point_mutation_keeps_length(
        (nucleotides, bounds) in genome_and_bounds(),
        prob in 0.0f64..=1.0,
        seed in any::<u64>()
    ) {
        let genome = Genome::new(nucleotides, bounds).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        prop_assert_eq!(point_mutate(&genome, prob, &mut rng).len(), genome.len());
    }

    /// A certain duplication grows the genome by the clamped width, unless
    /// that would pass the maximum, in which case it changes nothing.
    #[test]
    fn prop_duplication_width(
        (nucleotides, bounds) in genome_and_bounds(),
        width in 1usize..32,
        seed in any::<u64>()
    ) {
        let genome = Genome::new(nucleotides, bounds).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mutant = duplicate(&genome, 1.0, width, width, bounds, &mut rng);
        let grown = genome.len() + width.min(genome.len());
        if grown <= bounds.max {
            prop_assert_eq!(mutant.len(), grown);
        } else {
            prop_assert_eq!(mutant, genome);
        }
    }

    /// A certain deletion shrinks the genome by the clamped width, unless
    /// that would pass the minimum, in which case it changes nothing.
    #[test]
    fn prop_deletion_width(
        (nucleotides, bounds) in genome_and_bounds(),
        width in 1usize..32,
        seed in any::<u64>()
    ) {
        let genome = Genome::new(nucleotides, bounds).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mutant = delete(&genome, 1.0, width, width, bounds, &mut rng);
        let removed = width.min(genome.len());
        if genome.len() - removed >= bounds.min {
            prop_assert_eq!(mutant.len(), genome.len() - removed);
        } else {
            prop_assert_eq!(mutant, genome);
        }
    }

    /// A duplication and a deletion of the same width cancel out in length
    /// whenever both take effect.
    #[test]
    fn prop_duplicate_then_delete_keeps_length(
        (nucleotides, bounds) in genome_and_bounds(),
        width in 1usize..32,
        seed in any::<u64>()
    ) {
        let genome = Genome::new(nucleotides, bounds).unwrap();
        // Widths past the genome length are clamped differently by each step
        let width = width.min(genome.len());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grown = duplicate(&genome, 1.0, width, width, bounds, &mut rng);
        let shrunk = delete(&grown, 1.0, width, width, bounds, &mut rng);
        if grown.len() != genome.len() && shrunk.len() != grown.len() {
            prop_assert_eq!(shrunk.len(), genome.len());
        }
    }

    /// Selection returns exactly k in-range indices, and never picks a
    /// zero-fitness individual while some fitness is positive.
    #[test]
    fn prop_selection_in_range(
        fitness in prop::collection::vec(prop_oneof![Just(0.0f64), 0.0f64..100.0], 1..32),
        k in 0usize..64,
        seed in any::<u64>()
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let chosen = select_roulette(&fitness, k, &mut rng);
        prop_assert_eq!(chosen.len(), k);
        let any_positive = fitness.iter().any(|&f| f > 0.0);
        for index in chosen {
            prop_assert!(index < fitness.len());
            if any_positive {
                prop_assert!(fitness[index] > 0.0);
            }
        }
    }

    /// The hall of fame stays sorted, bounded and holds the best offer.
    #[test]
    fn prop_hall_of_fame_sorted(
        fitness in prop::collection::vec(0.0f64..10.0, 1..100),
        capacity in 1usize..16
    ) {
        let mut hof = HallOfFame::new(capacity);
        let offers = fitness.iter().enumerate().map(|(i, &f)| (IndividualId::new(i as u64), f));
        let (admitted, evicted) = hof.update(offers);

        prop_assert!(hof.len() <= capacity);
        prop_assert_eq!(hof.len(), admitted.len() - evicted.len());
        let kept: Vec<f64> = hof.iter().map(|e| e.fitness).collect();
        prop_assert!(kept.windows(2).all(|w| w[0] >= w[1]));
        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((hof.best().unwrap().fitness - best).abs() < f64::EPSILON);
    }

    /// Lineages run from generation 0 to the individual, one per generation,
    /// and releasing every handle empties the pedigree.
    #[test]
    fn prop_lineage_generations(
        parents in prop::collection::vec(
            prop::collection::vec(any::<prop::sample::Index>(), 4),
            1..20,
        )
    ) {
        let bounds = LengthBounds { min: 1, max: 4 };
        let genome = Genome::filled(0, 2, bounds).unwrap();
        let mut pedigree = Pedigree::new();
        let mut population: Vec<IndividualId> =
            (0..4).map(|_| pedigree.add_founder(genome.clone())).collect();

        for (generation, picks) in (1u64..).zip(&parents) {
            let offspring: Vec<IndividualId> = picks
                .iter()
                .map(|pick| {
                    let parent = population[pick.index(population.len())];
                    pedigree.add_offspring(parent, genome.clone(), generation)
                })
                .collect();
            for id in std::mem::replace(&mut population, offspring) {
                pedigree.release(id);
            }
        }

        let last = parents.len() as u64;
        for &id in &population {
            let lineage = pedigree.lineage(id);
            prop_assert_eq!(lineage.len() as u64, last + 1);
            for (generation, individual) in lineage.iter().enumerate() {
                prop_assert_eq!(individual.generation, generation as u64);
            }
        }

        for id in population {
            pedigree.release(id);
        }
        prop_assert!(pedigree.is_empty());
    }
}
