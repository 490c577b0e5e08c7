//! Evolutionary engine for animat genomes.
//!
//! A population of byte-string genomes evolves under fitness-proportional
//! selection and three mutation operators. Every individual remembers its
//! parent, so the full ancestry of any survivor can be read back at the end
//! of a run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Generation Scheduler (Evolution)  │
//! ├─────────────────────────────────────┤
//! │  Selection │ Mutation │ Evaluation  │
//! ├─────────────────────────────────────┤
//! │  Pedigree │ Hall of Fame │ Logbooks │
//! ├─────────────────────────────────────┤
//! │   Checkpoint / Output Persistence   │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use animats::evolution::{Evolution, LookupEvaluator, RunSettings};
//! use animats::experiment::{Experiment, ExperimentParams};
//!
//! let experiment = Experiment::derive(ExperimentParams::default())?;
//! let mut evolution = Evolution::new(experiment, RunSettings::default(), LookupEvaluator)?;
//! evolution.run(|_| {})?;
//! let output = evolution.output();
//! # Ok::<(), animats::error::EvolutionError>(())
//! ```

mod fitness;
mod genome;
mod hall_of_fame;
mod individual;
mod logbook;
mod mutation;
mod persistence;
mod scheduler;
mod selection;

pub use fitness::{Counters, Evaluation, Evaluator, FitnessFunction, LookupEvaluator, ResponseTable};
pub use genome::{Genome, LengthBounds, NUM_NUCLEOTIDES};
pub use hall_of_fame::{Entry, HallOfFame};
pub use individual::{Individual, IndividualId, Pedigree};
pub use logbook::{
    CorrectnessStatistics, FitnessStatistics, Logbook, Logbooks, Record, Statistics, Stats,
};
pub use mutation::{delete, duplicate, mutate, point_mutate, MutationConfig};
pub use persistence::{
    check_output_path, decode_checkpoint, encode_checkpoint, load_checkpoint, read_output,
    save_checkpoint, write_output, Checkpoint, Metadata, RunOutput, MAGIC, VERSION,
};
pub use scheduler::{Evolution, Phase, Progress, RunSettings};
pub use selection::select_roulette;
