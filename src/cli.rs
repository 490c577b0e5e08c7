//! CLI command implementations for Animats.

pub(crate) mod output;
pub(crate) mod resume;
pub(crate) mod run;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use animats::evolution::{read_output, Evaluator, Evolution, FitnessFunction, RunSettings};
use animats::{EvolutionError, ExperimentParams, ValidationError};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<EvolutionError> for CliError {
    fn from(e: EvolutionError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        Self::new(format!("invalid experiment: {e}"))
    }
}

/// Overrides for primary experiment parameters.
#[derive(Args, Debug, Default)]
pub(crate) struct ParamArgs {
    /// Number of generations to simulate
    #[arg(short = 'n', long)]
    num_gen: Option<u64>,

    /// Random number generator seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fitness function (see `fitness-functions`)
    #[arg(short, long)]
    fitness: Option<FitnessFunction>,

    /// Nucleotide mutation probability
    #[arg(short, long)]
    mut_prob: Option<f64>,

    /// Population size
    #[arg(short, long)]
    pop_size: Option<usize>,

    /// Duplication probability
    #[arg(long)]
    dup_prob: Option<f64>,

    /// Deletion probability
    #[arg(long)]
    del_prob: Option<f64>,

    /// Maximum genome length
    #[arg(long)]
    max_length: Option<usize>,

    /// Minimum genome length
    #[arg(long)]
    min_length: Option<usize>,

    /// Minimum width of a duplicated or deleted segment
    #[arg(long)]
    min_dup_del: Option<usize>,

    /// Maximum width of a duplicated or deleted segment
    #[arg(long)]
    max_dup_del: Option<usize>,

    /// Base of the natural fitness function
    #[arg(long)]
    nat_fit_base: Option<f64>,

    /// Seed every founder with the final genome of an earlier run's output
    #[arg(long, value_name = "OUTPUT")]
    init_genome: Option<PathBuf>,
}

impl ParamArgs {
    /// Apply the given overrides to `params`.
    pub(crate) fn apply(&self, params: &mut ExperimentParams) -> Result<(), CliError> {
        if let Some(value) = self.num_gen {
            params.ngen = value;
        }
        if let Some(value) = self.seed {
            params.rng_seed = value;
        }
        if let Some(value) = self.fitness {
            params.fitness_function = value;
        }
        if let Some(value) = self.mut_prob {
            params.mutation_prob = value;
        }
        if let Some(value) = self.pop_size {
            params.popsize = value;
        }
        if let Some(value) = self.dup_prob {
            params.duplication_prob = value;
        }
        if let Some(value) = self.del_prob {
            params.deletion_prob = value;
        }
        if let Some(value) = self.max_length {
            params.max_genome_length = value;
        }
        if let Some(value) = self.min_length {
            params.min_genome_length = value;
        }
        if let Some(value) = self.min_dup_del {
            params.min_dup_del_width = value;
        }
        if let Some(value) = self.max_dup_del {
            params.max_dup_del_width = value;
        }
        if let Some(value) = self.nat_fit_base {
            params.nat_fit_base = value;
        }
        if let Some(path) = &self.init_genome {
            let output = read_output(path)?;
            let genome = output
                .final_genome()
                .ok_or_else(|| CliError::new(format!("{} contains no lineage", path.display())))?;
            params.init_genome = Some(genome.to_vec());
        }
        Ok(())
    }
}

/// Recording, checkpointing and execution options.
#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)] // each bool is a command-line flag
pub(crate) struct RunArgs {
    /// Logbook recording interval, in generations
    #[arg(short, long, value_name = "FREQ")]
    data_record: Option<u64>,

    /// Lineage recording interval, in generations
    #[arg(short, long, value_name = "FREQ")]
    ind_record: Option<usize>,

    /// Status logging interval, in generations
    #[arg(short, long, value_name = "FREQ")]
    log_stdout: Option<u64>,

    /// Save the lineages of the entire final population
    #[arg(short, long, overrides_with = "best_lineage")]
    all_lineages: bool,

    /// Save only the lineage of the best final individual (the default for
    /// new runs; on resume, overrides a checkpoint saving all lineages)
    #[arg(long, overrides_with = "all_lineages")]
    best_lineage: bool,

    /// Write checkpoints to this file
    #[arg(long = "checkpoint", value_name = "PATH")]
    checkpoint_path: Option<PathBuf>,

    /// Minimum seconds between checkpoints
    #[arg(long, value_name = "SECS")]
    checkpoint_interval: Option<u64>,

    /// Replace the output file if it exists
    #[arg(long)]
    overwrite: bool,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Evaluation threads (default: CPU count)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl RunArgs {
    /// Apply the given options on top of `base`.
    pub(crate) fn settings(&self, base: RunSettings) -> RunSettings {
        RunSettings {
            logbook_interval: self.data_record.unwrap_or(base.logbook_interval),
            lineage_interval: self.ind_record.unwrap_or(base.lineage_interval),
            status_interval: self.log_stdout.unwrap_or(base.status_interval),
            checkpoint_interval: self
                .checkpoint_interval
                .map_or(base.checkpoint_interval, Duration::from_secs),
            checkpoint_path: self.checkpoint_path.clone().or(base.checkpoint_path),
            all_lineages: match (self.all_lineages, self.best_lineage) {
                (true, _) => true,
                (false, true) => false,
                (false, false) => base.all_lineages,
            },
        }
    }

    /// Size the global evaluation thread pool, if requested.
    pub(crate) fn configure_threads(&self) {
        if let Some(num_threads) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok(); // Ignore error if already initialized
        }
    }
}

/// Run `evolution` to completion, optionally behind a progress bar.
pub(crate) fn evolve<E: Evaluator>(
    evolution: &mut Evolution<E>,
    progress: bool,
) -> Result<(), CliError> {
    let bar = if progress {
        let bar = ProgressBar::new(evolution.experiment().params().ngen);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                     {pos}/{len} generations {msg}",
                )
                .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        bar.set_position(evolution.generation());
        Some(bar)
    } else {
        None
    };

    evolution.run(|progress| {
        if let Some(bar) = &bar {
            bar.set_position(progress.generation);
            bar.set_message(format!(
                "(correct {}, fitness {:.4})",
                progress.max_correct, progress.best_fitness
            ));
        }
    })?;

    if let Some(bar) = bar {
        bar.finish_with_message("done");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_overrides() {
        let args = ParamArgs {
            num_gen: Some(7),
            pop_size: Some(12),
            fitness: Some(FitnessFunction::Linear),
            ..ParamArgs::default()
        };
        let mut params = ExperimentParams::default();
        args.apply(&mut params).unwrap();
        assert_eq!(params.ngen, 7);
        assert_eq!(params.popsize, 12);
        assert_eq!(params.fitness_function, FitnessFunction::Linear);
        assert_eq!(params.rng_seed, ExperimentParams::default().rng_seed);
    }

    #[test]
    fn test_run_settings_fall_back_to_base() {
        let args = RunArgs {
            data_record: Some(5),
            ..RunArgs::default()
        };
        let base = RunSettings {
            status_interval: 9,
            ..RunSettings::default()
        };
        let settings = args.settings(base);
        assert_eq!(settings.logbook_interval, 5);
        assert_eq!(settings.status_interval, 9);
        assert!(settings.checkpoint_path.is_none());
    }

    #[test]
    fn test_lineage_choice_on_resume() {
        let stored = RunSettings {
            all_lineages: true,
            ..RunSettings::default()
        };
        assert!(RunArgs::default().settings(stored.clone()).all_lineages);
        let best = RunArgs {
            best_lineage: true,
            ..RunArgs::default()
        };
        assert!(!best.settings(stored).all_lineages);
        let all = RunArgs {
            all_lineages: true,
            ..RunArgs::default()
        };
        assert!(all.settings(RunSettings::default()).all_lineages);
    }

    #[test]
    fn test_lineage_flags_override_each_other() {
        use clap::Parser;

        #[derive(Parser, Debug)]
        struct Command {
            #[command(flatten)]
            run: RunArgs,
        }

        let args = ["animats", "--all-lineages", "--best-lineage"];
        let last_wins = Command::try_parse_from(args).unwrap();
        assert!(!last_wins.run.settings(RunSettings::default()).all_lineages);
        let args = ["animats", "--best-lineage", "-a"];
        let last_wins = Command::try_parse_from(args).unwrap();
        assert!(last_wins.run.settings(RunSettings::default()).all_lineages);
    }
}
