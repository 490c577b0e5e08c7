//! The generation loop.
//!
//! Each generation runs strictly after the previous one: roulette selection
//! over the current population, cloning, mutation of every clone on the
//! master RNG in population order, then parallel evaluation of the clones.
//! All random draws happen before evaluation is dispatched and results are
//! collected in population order, so a run is reproducible from its seed
//! whatever the thread count. Only generation boundaries are checkpointed.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EvolutionError, EvolutionResult, ValidationError};
use crate::evolution::fitness::Evaluator;
use crate::evolution::hall_of_fame::HallOfFame;
use crate::evolution::individual::{Individual, IndividualId, Pedigree};
use crate::evolution::logbook::Logbooks;
use crate::evolution::mutation::{mutate, MutationConfig};
use crate::evolution::persistence::{save_checkpoint, Checkpoint, Metadata, RunOutput};
use crate::evolution::selection::select_roulette;
use crate::experiment::Experiment;

/// Recording and checkpointing options that do not affect the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Record logbooks every this many generations.
    pub logbook_interval: u64,
    /// Keep every this many generations of each output lineage.
    pub lineage_interval: usize,
    /// Log a status line every this many generations.
    pub status_interval: u64,
    /// Minimum wall-clock time between checkpoints.
    pub checkpoint_interval: Duration,
    /// Where to write checkpoints; none are written if unset.
    pub checkpoint_path: Option<PathBuf>,
    /// Output the lineage of every final individual, not just the best.
    pub all_lineages: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            logbook_interval: 1,
            lineage_interval: 1,
            status_interval: 1,
            checkpoint_interval: Duration::from_secs(600),
            checkpoint_path: None,
            all_lineages: false,
        }
    }
}

impl RunSettings {
    /// Check that every interval is positive.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroInterval`] naming the first zero
    /// interval.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.logbook_interval == 0 {
            return Err(ValidationError::ZeroInterval("logbook_interval"));
        }
        if self.lineage_interval == 0 {
            return Err(ValidationError::ZeroInterval("lineage_interval"));
        }
        if self.status_interval == 0 {
            return Err(ValidationError::ZeroInterval("status_interval"));
        }
        Ok(())
    }
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building or restoring generation 0.
    Initializing,
    /// Producing generations.
    Running,
    /// Writing a checkpoint between generations.
    Checkpointing,
    /// The target generation count has been reached.
    Finished,
}

/// Snapshot reported after each generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Generation just completed.
    pub generation: u64,
    /// Target generation count.
    pub ngen: u64,
    /// Best fitness in the current population.
    pub best_fitness: f64,
    /// Most correct trials in the current population.
    pub max_correct: u32,
    /// Most incorrect trials in the current population.
    pub max_incorrect: u32,
}

/// An evolution run.
#[derive(Debug)]
pub struct Evolution<E> {
    experiment: Experiment,
    settings: RunSettings,
    evaluator: E,
    mutation: MutationConfig,
    phase: Phase,
    generation: u64,
    population: Vec<IndividualId>,
    pedigree: Pedigree,
    rng: ChaCha8Rng,
    hall_of_fame: HallOfFame,
    logbooks: Logbooks,
    elapsed_before: Duration,
    started: Instant,
    last_checkpoint: Instant,
}

impl<E: Evaluator> Evolution<E> {
    /// Start a run: build and evaluate generation 0 from the seed genome.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or any founder fails
    /// evaluation.
    pub fn new(
        experiment: Experiment,
        settings: RunSettings,
        evaluator: E,
    ) -> EvolutionResult<Self> {
        settings.validate()?;
        let params = experiment.params();
        let rng = ChaCha8Rng::seed_from_u64(params.rng_seed);
        let mut pedigree = Pedigree::new();
        let population: Vec<IndividualId> = (0..params.popsize)
            .map(|_| pedigree.add_founder(experiment.init_genome().clone()))
            .collect();
        let started = Instant::now();
        let mut evolution = Self {
            mutation: MutationConfig::from(&experiment),
            hall_of_fame: HallOfFame::new(params.popsize),
            experiment,
            settings,
            evaluator,
            phase: Phase::Initializing,
            generation: 0,
            population: Vec::new(),
            pedigree,
            rng,
            logbooks: Logbooks::default(),
            elapsed_before: Duration::ZERO,
            started,
            last_checkpoint: started,
        };
        evolution.evaluate(&population)?;
        evolution.record(&population, 0);
        evolution.population = population;
        evolution.phase = Phase::Running;
        log::info!(
            "initialized {} individuals with {}-nucleotide seed genomes",
            evolution.population.len(),
            evolution.experiment.init_genome().len()
        );
        Ok(evolution)
    }

    /// Continue a run from a checkpoint.
    ///
    /// The checkpoint's parameters are used as they are; callers may raise
    /// `ngen` beforehand to extend the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters or settings are invalid, or the
    /// checkpoint contradicts itself.
    pub fn resume(
        checkpoint: Checkpoint,
        settings: RunSettings,
        evaluator: E,
    ) -> EvolutionResult<Self> {
        settings.validate()?;
        let experiment = Experiment::derive(checkpoint.params)?;
        let popsize = experiment.params().popsize;
        if checkpoint.population.len() != popsize {
            return Err(EvolutionError::InconsistentCheckpoint(format!(
                "population has {} individuals but popsize is {popsize}",
                checkpoint.population.len()
            )));
        }
        if checkpoint.hall_of_fame.capacity() != popsize {
            return Err(EvolutionError::InconsistentCheckpoint(format!(
                "hall of fame holds {} but popsize is {popsize}",
                checkpoint.hall_of_fame.capacity()
            )));
        }
        let missing = checkpoint
            .population
            .iter()
            .copied()
            .chain(checkpoint.hall_of_fame.ids())
            .find(|&id| checkpoint.pedigree.get(id).is_none());
        if let Some(id) = missing {
            return Err(EvolutionError::InconsistentCheckpoint(format!(
                "individual {id} is referenced but not in the pedigree"
            )));
        }

        let started = Instant::now();
        log::info!("resuming at generation {}", checkpoint.generation);
        Ok(Self {
            mutation: MutationConfig::from(&experiment),
            experiment,
            settings,
            evaluator,
            phase: Phase::Running,
            generation: checkpoint.generation,
            population: checkpoint.population,
            pedigree: checkpoint.pedigree,
            rng: checkpoint.rng,
            hall_of_fame: checkpoint.hall_of_fame,
            logbooks: checkpoint.logbooks,
            elapsed_before: Duration::try_from_secs_f64(checkpoint.elapsed).unwrap_or_default(),
            started,
            last_checkpoint: started,
        })
    }

    /// Run generations until `ngen` is reached, calling `on_generation`
    /// after each one and checkpointing when due.
    ///
    /// A run resumed at or past `ngen` produces no generations.
    ///
    /// # Errors
    ///
    /// Returns an error if an evaluation or a checkpoint write fails.
    pub fn run<F: FnMut(&Progress)>(&mut self, mut on_generation: F) -> EvolutionResult<()> {
        let ngen = self.experiment.params().ngen;
        self.phase = Phase::Running;
        while self.generation < ngen {
            self.step()?;
            let progress = self.progress();
            if self.generation % self.settings.status_interval == 0 {
                log_status(&progress);
            }
            on_generation(&progress);

            let finished = self.generation >= ngen;
            let due =
                finished || self.last_checkpoint.elapsed() >= self.settings.checkpoint_interval;
            if due && self.settings.checkpoint_path.is_some() {
                self.phase = Phase::Checkpointing;
                self.write_checkpoint()?;
                self.phase = Phase::Running;
            }
        }
        self.phase = Phase::Finished;
        log::info!(
            "simulated {} generations in {:.2} seconds",
            self.generation,
            self.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Produce one generation.
    ///
    /// # Errors
    ///
    /// Returns an error if any offspring fails evaluation.
    pub fn step(&mut self) -> EvolutionResult<()> {
        let generation = self.generation + 1;
        let fitness: Vec<f64> = self
            .population
            .iter()
            .map(|&id| self.pedigree.individual(id).fitness())
            .collect();
        let selected = select_roulette(&fitness, self.population.len(), &mut self.rng);

        let offspring: Vec<IndividualId> = selected
            .into_iter()
            .map(|index| {
                let parent = self.population[index];
                let genome = mutate(
                    &self.pedigree.individual(parent).genome,
                    &self.mutation,
                    &mut self.rng,
                );
                self.pedigree.add_offspring(parent, genome, generation)
            })
            .collect();

        if let Err(err) = self.evaluate(&offspring) {
            // A failed generation leaves no trace in the pedigree
            for &id in &offspring {
                self.pedigree.release(id);
            }
            return Err(err);
        }
        self.record(&offspring, generation);

        for id in std::mem::replace(&mut self.population, offspring) {
            self.pedigree.release(id);
        }
        self.generation = generation;
        log::debug!(
            "generation {generation}: {} individuals alive in the pedigree",
            self.pedigree.len()
        );
        Ok(())
    }

    fn evaluate(&mut self, ids: &[IndividualId]) -> EvolutionResult<()> {
        let evaluator = &self.evaluator;
        let experiment = &self.experiment;
        let pedigree = &self.pedigree;
        let results: Vec<_> = ids
            .par_iter()
            .map(|&id| evaluator.evaluate_genome(&pedigree.individual(id).genome, experiment))
            .collect();
        for (&id, result) in ids.iter().zip(results) {
            let evaluation =
                result.map_err(|source| EvolutionError::Evaluation { id: id.get(), source })?;
            self.pedigree.set_evaluation(id, evaluation);
        }
        Ok(())
    }

    /// Update the hall of fame with a new generation and record its
    /// statistics when the logbook interval is due.
    fn record(&mut self, ids: &[IndividualId], generation: u64) {
        let candidates: Vec<(IndividualId, f64)> = ids
            .iter()
            .map(|&id| (id, self.pedigree.individual(id).fitness()))
            .collect();
        let (admitted, evicted) = self.hall_of_fame.update(candidates);
        for id in admitted {
            self.pedigree.retain(id);
        }
        for id in evicted {
            self.pedigree.release(id);
        }

        if generation % self.settings.logbook_interval == 0 {
            let individuals: Vec<&Individual> =
                ids.iter().map(|&id| self.pedigree.individual(id)).collect();
            self.logbooks.record(generation, &individuals);
        }
    }

    fn write_checkpoint(&mut self) -> EvolutionResult<()> {
        let Some(path) = self.settings.checkpoint_path.clone() else {
            return Ok(());
        };
        save_checkpoint(&self.checkpoint(), &path)?;
        self.last_checkpoint = Instant::now();
        log::info!("checkpointed generation {} to {}", self.generation, path.display());
        Ok(())
    }
}

impl<E> Evolution<E> {
    /// Snapshot the run at the current generation boundary.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            params: self.experiment.params().clone(),
            settings: self.settings.clone(),
            population: self.population.clone(),
            pedigree: self.pedigree.clone(),
            generation: self.generation,
            rng: self.rng.clone(),
            hall_of_fame: self.hall_of_fame.clone(),
            logbooks: self.logbooks.clone(),
            elapsed: self.elapsed().as_secs_f64(),
        }
    }

    /// Build the run output: lineages, logbooks, hall of fame and metadata.
    #[must_use]
    pub fn output(&self) -> RunOutput {
        let roots: Vec<IndividualId> = if self.settings.all_lineages {
            self.population.clone()
        } else {
            self.most_correct().into_iter().collect()
        };
        let lineages = roots
            .into_iter()
            .map(|id| {
                self.pedigree
                    .lineage(id)
                    .into_iter()
                    .step_by(self.settings.lineage_interval)
                    .cloned()
                    .collect()
            })
            .collect();
        let hof = self
            .hall_of_fame
            .ids()
            .map(|id| self.pedigree.individual(id).clone())
            .collect();
        RunOutput {
            experiment: self.experiment.params().clone(),
            lineages,
            logbooks: self.logbooks.clone(),
            hof,
            metadata: Metadata {
                elapsed: self.elapsed().as_secs_f64(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generation: self.generation,
            },
        }
    }

    /// Progress summary of the current population.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let individuals = self.population.iter().map(|&id| self.pedigree.individual(id));
        let mut progress = Progress {
            generation: self.generation,
            ngen: self.experiment.params().ngen,
            best_fitness: 0.0,
            max_correct: 0,
            max_incorrect: 0,
        };
        for individual in individuals {
            let counters = individual.counters();
            progress.best_fitness = progress.best_fitness.max(individual.fitness());
            progress.max_correct = progress.max_correct.max(counters.correct);
            progress.max_incorrect = progress.max_incorrect.max(counters.incorrect);
        }
        progress
    }

    /// First individual of the population with the most correct trials.
    fn most_correct(&self) -> Option<IndividualId> {
        self.population
            .iter()
            .copied()
            .reduce(|best, id| {
                let correct = |id| self.pedigree.individual(id).counters().correct;
                if correct(id) > correct(best) { id } else { best }
            })
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last completed generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The experiment being run.
    #[must_use]
    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Run settings.
    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Current population, in order.
    #[must_use]
    pub fn population(&self) -> &[IndividualId] {
        &self.population
    }

    /// Every live individual.
    #[must_use]
    pub fn pedigree(&self) -> &Pedigree {
        &self.pedigree
    }

    /// Best individuals so far.
    #[must_use]
    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Recorded statistics.
    #[must_use]
    pub fn logbooks(&self) -> &Logbooks {
        &self.logbooks
    }

    /// Simulation time, including time before any resume.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed_before + self.started.elapsed()
    }
}

fn log_status(progress: &Progress) {
    let width = progress.ngen.to_string().len();
    log::info!(
        "[Generation] {:>width$}  [Max Correct] {:>3}  [Max Incorrect] {:>3}  [Max Fitness] {:.4}",
        progress.generation,
        progress.max_correct,
        progress.max_incorrect,
        progress.best_fitness,
    );
}
