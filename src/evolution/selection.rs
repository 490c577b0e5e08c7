//! Selection operators.
//!
//! Roulette-wheel selection by rejection sampling: draw a uniform candidate,
//! accept it with probability `fitness / max_fitness`, repeat until accepted.
//! Selection returns population indices; cloning is up to the caller.

use rand::Rng;

/// Select `k` indices into `fitness`, with replacement, proportionally to
/// fitness.
///
/// A population whose fitness is all zero (where the acceptance ratio is
/// undefined) is sampled uniformly. An empty population yields an empty
/// selection.
#[must_use]
pub fn select_roulette<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> Vec<usize> {
    if fitness.is_empty() {
        return Vec::new();
    }
    let max_fitness = fitness.iter().copied().fold(0.0, f64::max);
    if max_fitness <= 0.0 {
        return (0..k).map(|_| rng.gen_range(0..fitness.len())).collect();
    }
    (0..k)
        .map(|_| loop {
            let candidate = rng.gen_range(0..fitness.len());
            if rng.r#gen::<f64>() < fitness[candidate] / max_fitness {
                break candidate;
            }
        })
        .collect()
}
