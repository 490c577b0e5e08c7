#![no_main]

use animats::{Experiment, ExperimentParams};
use libfuzzer_sys::fuzz_target;

// Arbitrary experiment JSON either fails validation or derives a
// self-consistent experiment.
fuzz_target!(|data: &[u8]| {
    let Ok(params) = serde_json::from_slice::<ExperimentParams>(data) else {
        return;
    };
    // Keep seed genomes and state tables small enough to build quickly
    let num_nodes = params
        .num_sensors
        .saturating_add(params.num_hidden)
        .saturating_add(params.num_motors);
    if params.init_genome_length > 100_000 || num_nodes > 12 {
        return;
    }
    if let Ok(experiment) = Experiment::derive(params) {
        assert_eq!(experiment.possible_states().len(), experiment.num_possible_states());
        assert!(experiment.genome_bounds().contains(experiment.init_genome().len()));
        assert_eq!(experiment.block_patterns().len(), experiment.hit_multipliers().len());
    }
});
