//! Per-generation statistics archive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evolution::individual::Individual;

/// Named statistics for one generation.
pub type Stats = BTreeMap<String, f64>;

/// Summary of one recorded generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Generation number.
    #[serde(rename = "gen")]
    pub generation: u64,
    /// Statistic name to value.
    pub stats: Stats,
}

/// Records ordered by generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Logbook {
    records: Vec<Record>,
}

impl Logbook {
    /// Create an empty logbook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `stats` for `generation`. Records stay ordered by
    /// generation; recording a generation again replaces its entry.
    pub fn record(&mut self, generation: u64, stats: Stats) {
        let index = self.records.partition_point(|r| r.generation < generation);
        match self.records.get_mut(index) {
            Some(existing) if existing.generation == generation => existing.stats = stats,
            _ => self.records.insert(index, Record { generation, stats }),
        }
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The fitness and correctness logbooks kept by a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logbooks {
    /// [`FitnessStatistics`] per recorded generation.
    pub fitness: Logbook,
    /// [`CorrectnessStatistics`] per recorded generation.
    pub correct: Logbook,
}

impl Logbooks {
    /// Record both summaries of `individuals` for `generation`.
    pub fn record(&mut self, generation: u64, individuals: &[&Individual]) {
        self.fitness.record(generation, FitnessStatistics.compile(individuals));
        self.correct.record(generation, CorrectnessStatistics.compile(individuals));
    }
}

/// Summarizes a generation into named statistics.
pub trait Statistics {
    /// Compute the statistics of `individuals`.
    fn compile(&self, individuals: &[&Individual]) -> Stats;
}

/// Mean, population standard deviation, minimum and maximum fitness.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessStatistics;

impl Statistics for FitnessStatistics {
    #[allow(clippy::cast_precision_loss)]
    fn compile(&self, individuals: &[&Individual]) -> Stats {
        let mut stats = Stats::new();
        if individuals.is_empty() {
            return stats;
        }
        let n = individuals.len() as f64;
        let fitness = || individuals.iter().map(|i| i.fitness());
        let avg = fitness().sum::<f64>() / n;
        let var = fitness().map(|f| (f - avg).powi(2)).sum::<f64>() / n;
        stats.insert("avg".to_owned(), avg);
        stats.insert("std".to_owned(), var.sqrt());
        stats.insert("min".to_owned(), fitness().fold(f64::INFINITY, f64::min));
        stats.insert("max".to_owned(), fitness().fold(f64::NEG_INFINITY, f64::max));
        stats
    }
}

/// Highest number of correct and of incorrect trials, each taken
/// independently over the generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectnessStatistics;

impl Statistics for CorrectnessStatistics {
    fn compile(&self, individuals: &[&Individual]) -> Stats {
        let mut stats = Stats::new();
        if individuals.is_empty() {
            return stats;
        }
        let counters = || individuals.iter().map(|i| i.counters());
        let correct = counters().map(|c| c.correct).max().unwrap_or(0);
        let incorrect = counters().map(|c| c.incorrect).max().unwrap_or(0);
        stats.insert("correct".to_owned(), f64::from(correct));
        stats.insert("incorrect".to_owned(), f64::from(incorrect));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::fitness::{Counters, Evaluation};
    use crate::evolution::genome::{Genome, LengthBounds};
    use crate::evolution::individual::IndividualId;

    fn individual(fitness: f64, correct: u32, incorrect: u32) -> Individual {
        let bounds = LengthBounds { min: 1, max: 4 };
        Individual {
            id: IndividualId::new(0),
            genome: Genome::filled(0, 2, bounds).unwrap(),
            generation: 0,
            parent: None,
            evaluation: Some(Evaluation {
                fitness,
                counters: Counters { correct, incorrect },
            }),
        }
    }

    #[test]
    fn test_fitness_statistics() {
        let population = [individual(1.0, 0, 0), individual(3.0, 0, 0)];
        let refs: Vec<&Individual> = population.iter().collect();
        let stats = FitnessStatistics.compile(&refs);
        assert!((stats["avg"] - 2.0).abs() < 1e-12);
        assert!((stats["std"] - 1.0).abs() < 1e-12);
        assert!((stats["min"] - 1.0).abs() < 1e-12);
        assert!((stats["max"] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_correctness_maxima_are_independent() {
        let population = [individual(0.0, 10, 2), individual(0.0, 4, 9)];
        let refs: Vec<&Individual> = population.iter().collect();
        let stats = CorrectnessStatistics.compile(&refs);
        assert!((stats["correct"] - 10.0).abs() < f64::EPSILON);
        assert!((stats["incorrect"] - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_records_stay_ordered() {
        let mut logbook = Logbook::new();
        logbook.record(4, Stats::new());
        logbook.record(0, Stats::new());
        logbook.record(2, Stats::new());
        let gens: Vec<u64> = logbook.records().iter().map(|r| r.generation).collect();
        assert_eq!(gens, vec![0, 2, 4]);
        assert_eq!(logbook.last().unwrap().generation, 4);
    }

    #[test]
    fn test_rerecord_replaces() {
        let mut logbook = Logbook::new();
        logbook.record(1, Stats::from([("max".to_owned(), 1.0)]));
        logbook.record(1, Stats::from([("max".to_owned(), 2.0)]));
        assert_eq!(logbook.len(), 1);
        assert!((logbook.records()[0].stats["max"] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_shape() {
        let mut logbook = Logbook::new();
        logbook.record(3, Stats::from([("correct".to_owned(), 5.0)]));
        let json = serde_json::to_value(&logbook).unwrap();
        assert_eq!(json, serde_json::json!([{ "gen": 3, "stats": { "correct": 5.0 } }]));
    }
}
