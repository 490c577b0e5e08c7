//! Experiment parameters and the combinatorial state space derived from them.
//!
//! [`ExperimentParams`] holds the primary, user-facing parameters. An
//! [`Experiment`] is built from them once by [`Experiment::derive`], which
//! validates them and eagerly computes every secondary parameter: node index
//! partitions, power sets, enumerated state tables, sensor placement and the
//! task encoding. The result is immutable and shared read-only by every
//! other component.
//!
//! Only the primary parameters are ever serialized; deserializing an
//! `Experiment` re-derives everything else.

mod states;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvolutionError, EvolutionResult, ValidationError};
use crate::evolution::{Counters, FitnessFunction, Genome, LengthBounds};

pub use states::StateTable;

/// Minimum animat body length, in world cells.
pub const MIN_BODY_LENGTH: usize = 3;

/// Largest supported total node count; state tables grow as `2^num_nodes`.
pub const MAX_NODES: usize = 20;

/// Widest supported block pattern (patterns are stored as `u64`).
pub const MAX_PATTERN_WIDTH: usize = 64;

/// Largest supported world width or height, in cells.
pub const MAX_WORLD_DIMENSION: usize = 1 << 16;

/// One task condition: a block pattern and the multiplier applied when the
/// animat hits it (positive: the block should be caught; negative: avoided).
///
/// Serialized as a `[multiplier, pattern]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, String)", into = "(i32, String)")]
pub struct TaskCondition {
    /// Hit multiplier.
    pub multiplier: i32,
    /// Block pattern: `1` for a block cell, `_` or `0` for empty.
    pub pattern: String,
}

impl TaskCondition {
    /// Create a task condition.
    #[must_use]
    pub fn new(multiplier: i32, pattern: impl Into<String>) -> Self {
        Self {
            multiplier,
            pattern: pattern.into(),
        }
    }

    /// Pattern as an integer: blanks become `0` and the string is reversed
    /// before parsing as binary, since the world is mirrored.
    fn block_pattern(&self) -> Result<u64, ValidationError> {
        let reversed: String = self
            .pattern
            .chars()
            .rev()
            .map(|c| if c == '_' { '0' } else { c })
            .collect();
        if !reversed.chars().all(|c| c == '0' || c == '1') {
            return Err(ValidationError::InvalidPattern(self.pattern.clone()));
        }
        u64::from_str_radix(&reversed, 2)
            .map_err(|_| ValidationError::InvalidPattern(self.pattern.clone()))
    }
}

impl From<(i32, String)> for TaskCondition {
    fn from((multiplier, pattern): (i32, String)) -> Self {
        Self { multiplier, pattern }
    }
}

impl From<TaskCondition> for (i32, String) {
    fn from(condition: TaskCondition) -> Self {
        (condition.multiplier, condition.pattern)
    }
}

/// Primary experiment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentParams {
    /// Number of sensor nodes.
    pub num_sensors: usize,
    /// Number of hidden nodes.
    pub num_hidden: usize,
    /// Number of motor nodes.
    pub num_motors: usize,
    /// World width in cells.
    pub world_width: usize,
    /// World height in cells.
    pub world_height: usize,
    /// Task conditions; every pattern has the same width.
    pub task: Vec<TaskCondition>,
    /// Per-locus point mutation probability.
    pub mutation_prob: f64,
    /// Segmental duplication probability.
    pub duplication_prob: f64,
    /// Segmental deletion probability.
    pub deletion_prob: f64,
    /// Minimum width of a duplicated or deleted segment.
    pub min_dup_del_width: usize,
    /// Maximum width of a duplicated or deleted segment.
    pub max_dup_del_width: usize,
    /// Minimum genome length.
    pub min_genome_length: usize,
    /// Maximum genome length.
    pub max_genome_length: usize,
    /// Nucleotide the default seed genome is filled with.
    pub init_genome_value: u8,
    /// Length of the default seed genome.
    pub init_genome_length: usize,
    /// Explicit seed genome, overriding the default one.
    pub init_genome: Option<Vec<u8>>,
    /// Fitness function applied to task counters.
    pub fitness_function: FitnessFunction,
    /// Base of the natural fitness function.
    pub nat_fit_base: f64,
    /// Population size.
    pub popsize: usize,
    /// Number of generations to simulate.
    pub ngen: u64,
    /// Random number generator seed.
    pub rng_seed: u64,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            num_sensors: 2,
            num_hidden: 4,
            num_motors: 2,
            world_width: 16,
            world_height: 36,
            task: vec![
                TaskCondition::new(1, "1_______________"),
                TaskCondition::new(-1, "111_____________"),
            ],
            mutation_prob: 0.005,
            duplication_prob: 0.05,
            deletion_prob: 0.02,
            min_dup_del_width: 15,
            max_dup_del_width: 511,
            min_genome_length: 1000,
            max_genome_length: 10_000,
            init_genome_value: 127,
            init_genome_length: 5000,
            init_genome: None,
            fitness_function: FitnessFunction::Natural,
            nat_fit_base: 1.02,
            popsize: 100,
            ngen: 10,
            rng_seed: 0,
        }
    }
}

/// Experiment files hold either bare parameters or an `experiment` section.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExperimentFile {
    Sectioned { experiment: ExperimentParams },
    Bare(ExperimentParams),
}

/// A validated experiment with all derived parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExperimentParams", into = "ExperimentParams")]
pub struct Experiment {
    params: ExperimentParams,
    num_nodes: usize,
    sensor_indices: Vec<usize>,
    hidden_indices: Vec<usize>,
    motor_indices: Vec<usize>,
    sensor_hidden_indices: Vec<usize>,
    hidden_motor_indices: Vec<usize>,
    sensor_motor_indices: Vec<usize>,
    hidden_powerset: Vec<Vec<usize>>,
    sensors_and_hidden_powerset: Vec<Vec<usize>>,
    hidden_and_motor_powerset: Vec<Vec<usize>>,
    num_sensor_states: usize,
    num_hidden_states: usize,
    num_motor_states: usize,
    num_possible_states: usize,
    possible_states: StateTable,
    sensor_motor_states: StateTable,
    sensor_locations: Vec<usize>,
    hit_multipliers: Vec<i32>,
    block_patterns: Vec<u64>,
    init_genome: Genome,
    num_trials: usize,
}

impl TryFrom<ExperimentParams> for Experiment {
    type Error = ValidationError;

    fn try_from(params: ExperimentParams) -> Result<Self, Self::Error> {
        Self::derive(params)
    }
}

impl From<Experiment> for ExperimentParams {
    fn from(experiment: Experiment) -> Self {
        experiment.params
    }
}

impl Experiment {
    /// Validate `params` and derive every secondary parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first invalid parameter.
    pub fn derive(params: ExperimentParams) -> Result<Self, ValidationError> {
        let block_patterns = validate(&params)?;

        let (s, h, m) = (params.num_sensors, params.num_hidden, params.num_motors);
        let num_nodes = s + h + m;
        let sensor_indices: Vec<usize> = (0..s).collect();
        let hidden_indices: Vec<usize> = (s..s + h).collect();
        let motor_indices: Vec<usize> = (s + h..num_nodes).collect();
        let sensor_hidden_indices = [sensor_indices.as_slice(), &hidden_indices].concat();
        let hidden_motor_indices = [hidden_indices.as_slice(), &motor_indices].concat();
        let sensor_motor_indices = [sensor_indices.as_slice(), &motor_indices].concat();

        let bounds = LengthBounds {
            min: params.min_genome_length,
            max: params.max_genome_length,
        };
        let init_genome = match &params.init_genome {
            Some(nucleotides) => Genome::new(nucleotides.clone(), bounds),
            None => Genome::filled(params.init_genome_value, params.init_genome_length, bounds),
        }
        .map_err(|violation| ValidationError::InitialGenomeLength {
            length: violation.attempted,
            min: violation.min,
            max: violation.max,
        })?;

        Ok(Self {
            num_nodes,
            hidden_powerset: states::powerset(&hidden_indices),
            sensors_and_hidden_powerset: states::powerset(&sensor_hidden_indices),
            hidden_and_motor_powerset: states::powerset(&hidden_motor_indices),
            num_sensor_states: 1 << s,
            num_hidden_states: 1 << h,
            num_motor_states: 1 << m,
            num_possible_states: 1 << num_nodes,
            possible_states: states::little_endian_states(num_nodes),
            sensor_motor_states: states::sensor_motor_states(s, m),
            sensor_locations: sensor_locations(s),
            hit_multipliers: params.task.iter().map(|c| c.multiplier).collect(),
            block_patterns,
            init_genome,
            num_trials: trial_count(&params),
            sensor_indices,
            hidden_indices,
            motor_indices,
            sensor_hidden_indices,
            hidden_motor_indices,
            sensor_motor_indices,
            params,
        })
    }

    /// Read a JSON experiment file and derive it.
    ///
    /// The file may contain the parameters directly or under an
    /// `"experiment"` key; missing parameters take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// parameters are invalid.
    pub fn load(path: &Path) -> EvolutionResult<Self> {
        Ok(Self::derive(load_params(path)?)?)
    }

    /// Primary parameters.
    #[must_use]
    pub fn params(&self) -> &ExperimentParams {
        &self.params
    }

    /// Genome length bounds.
    #[must_use]
    pub fn genome_bounds(&self) -> LengthBounds {
        LengthBounds {
            min: self.params.min_genome_length,
            max: self.params.max_genome_length,
        }
    }

    /// Total number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Sensor node indices.
    #[must_use]
    pub fn sensor_indices(&self) -> &[usize] {
        &self.sensor_indices
    }

    /// Hidden node indices.
    #[must_use]
    pub fn hidden_indices(&self) -> &[usize] {
        &self.hidden_indices
    }

    /// Motor node indices.
    #[must_use]
    pub fn motor_indices(&self) -> &[usize] {
        &self.motor_indices
    }

    /// Sensor then hidden node indices.
    #[must_use]
    pub fn sensor_hidden_indices(&self) -> &[usize] {
        &self.sensor_hidden_indices
    }

    /// Hidden then motor node indices.
    #[must_use]
    pub fn hidden_motor_indices(&self) -> &[usize] {
        &self.hidden_motor_indices
    }

    /// Sensor then motor node indices.
    #[must_use]
    pub fn sensor_motor_indices(&self) -> &[usize] {
        &self.sensor_motor_indices
    }

    /// All subsets of the hidden indices.
    #[must_use]
    pub fn hidden_powerset(&self) -> &[Vec<usize>] {
        &self.hidden_powerset
    }

    /// All subsets of the sensor and hidden indices.
    #[must_use]
    pub fn sensors_and_hidden_powerset(&self) -> &[Vec<usize>] {
        &self.sensors_and_hidden_powerset
    }

    /// All subsets of the hidden and motor indices.
    #[must_use]
    pub fn hidden_and_motor_powerset(&self) -> &[Vec<usize>] {
        &self.hidden_and_motor_powerset
    }

    /// Number of possible sensor states.
    #[must_use]
    pub fn num_sensor_states(&self) -> usize {
        self.num_sensor_states
    }

    /// Number of possible hidden states.
    #[must_use]
    pub fn num_hidden_states(&self) -> usize {
        self.num_hidden_states
    }

    /// Number of possible motor states.
    #[must_use]
    pub fn num_motor_states(&self) -> usize {
        self.num_motor_states
    }

    /// Number of possible whole-animat states.
    #[must_use]
    pub fn num_possible_states(&self) -> usize {
        self.num_possible_states
    }

    /// Every whole-animat state, indexed little-endian by state id.
    #[must_use]
    pub fn possible_states(&self) -> &StateTable {
        &self.possible_states
    }

    /// Every sensor/motor state pair, see [`Experiment::sensor_motor_state`].
    #[must_use]
    pub fn sensor_motor_states(&self) -> &StateTable {
        &self.sensor_motor_states
    }

    /// Concatenated big-endian bits of sensor state `sensor` and motor state
    /// `motor`.
    ///
    /// # Panics
    ///
    /// Panics if either state is out of range.
    #[must_use]
    pub fn sensor_motor_state(&self, sensor: usize, motor: usize) -> &[u8] {
        assert!(motor < self.num_motor_states, "motor state {motor} out of range");
        self.sensor_motor_states.row(sensor * self.num_motor_states + motor)
    }

    /// Body cell of each sensor.
    #[must_use]
    pub fn sensor_locations(&self) -> &[usize] {
        &self.sensor_locations
    }

    /// Hit multiplier of each task condition.
    #[must_use]
    pub fn hit_multipliers(&self) -> &[i32] {
        &self.hit_multipliers
    }

    /// Block pattern of each task condition.
    #[must_use]
    pub fn block_patterns(&self) -> &[u64] {
        &self.block_patterns
    }

    /// Seed genome for generation 0.
    #[must_use]
    pub fn init_genome(&self) -> &Genome {
        &self.init_genome
    }

    /// Trials per evaluation: tasks × two directions × start positions.
    #[must_use]
    pub fn num_trials(&self) -> usize {
        self.num_trials
    }
}

/// Read experiment parameters from a JSON file without deriving them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_params(path: &Path) -> EvolutionResult<ExperimentParams> {
    let text = fs::read_to_string(path).map_err(|source| EvolutionError::ExperimentIo {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ExperimentFile = serde_json::from_str(&text).map_err(|source| EvolutionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match file {
        ExperimentFile::Sectioned { experiment } => experiment,
        ExperimentFile::Bare(params) => params,
    })
}

/// Check every primary parameter, returning the parsed block patterns.
fn validate(params: &ExperimentParams) -> Result<Vec<u64>, ValidationError> {
    if params.world_width == 0 || params.world_height == 0 {
        return Err(ValidationError::EmptyWorld {
            width: params.world_width,
            height: params.world_height,
        });
    }
    if params.world_width > MAX_WORLD_DIMENSION || params.world_height > MAX_WORLD_DIMENSION {
        return Err(ValidationError::WorldTooLarge {
            width: params.world_width,
            height: params.world_height,
            max: MAX_WORLD_DIMENSION,
        });
    }
    for (name, value) in [
        ("mutation_prob", params.mutation_prob),
        ("duplication_prob", params.duplication_prob),
        ("deletion_prob", params.deletion_prob),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::Probability { name, value });
        }
    }
    for (min_name, min, max_name, max) in [
        (
            "min_genome_length",
            params.min_genome_length,
            "max_genome_length",
            params.max_genome_length,
        ),
        (
            "min_dup_del_width",
            params.min_dup_del_width,
            "max_dup_del_width",
            params.max_dup_del_width,
        ),
    ] {
        if min > max {
            return Err(ValidationError::InvertedBounds {
                min_name,
                min,
                max_name,
                max,
            });
        }
    }
    if params.min_genome_length == 0 {
        return Err(ValidationError::EmptyGenome);
    }
    let num_nodes = params
        .num_sensors
        .saturating_add(params.num_hidden)
        .saturating_add(params.num_motors);
    if num_nodes > MAX_NODES {
        return Err(ValidationError::TooManyNodes { num_nodes, max: MAX_NODES });
    }
    if params.popsize == 0 {
        return Err(ValidationError::EmptyPopulation);
    }
    if !(params.nat_fit_base.is_finite() && params.nat_fit_base > 0.0) {
        return Err(ValidationError::FitnessBase(params.nat_fit_base));
    }

    let Some(first) = params.task.first() else {
        return Err(ValidationError::EmptyTask);
    };
    let expected = first.pattern.chars().count();
    let max = params.world_width.min(MAX_PATTERN_WIDTH);
    if expected == 0 || expected > max {
        return Err(ValidationError::PatternWidth { width: expected, max });
    }
    let block_patterns = params
        .task
        .iter()
        .enumerate()
        .map(|(index, condition)| {
            let width = condition.pattern.chars().count();
            if width == expected {
                condition.block_pattern()
            } else {
                Err(ValidationError::InconsistentTask { index, width, expected })
            }
        })
        .collect::<Result<Vec<u64>, _>>()?;

    // Task counters are u32, and the best possible score must stay finite.
    let num_trials = trial_count(params);
    let Ok(max_correct) = u32::try_from(num_trials) else {
        return Err(ValidationError::TooManyTrials {
            num_trials,
            max: u32::MAX,
        });
    };
    let best = params
        .fitness_function
        .apply(Counters { correct: max_correct, incorrect: 0 }, params.nat_fit_base);
    if !best.is_finite() {
        return Err(ValidationError::FitnessOverflow {
            nat_fit_base: params.nat_fit_base,
            num_trials,
        });
    }
    Ok(block_patterns)
}

/// Trials per evaluation: tasks × two directions × start positions.
fn trial_count(params: &ExperimentParams) -> usize {
    params
        .task
        .len()
        .saturating_mul(2)
        .saturating_mul(params.world_width)
}

/// Sensor body cells. With fewer sensors than the minimum body length, a gap
/// is left in the middle of the body.
fn sensor_locations(num_sensors: usize) -> Vec<usize> {
    if num_sensors >= MIN_BODY_LENGTH {
        return (0..num_sensors).collect();
    }
    let gap = MIN_BODY_LENGTH - num_sensors;
    let gap_start = MIN_BODY_LENGTH / 2;
    (0..gap_start)
        .chain(gap_start + gap..MIN_BODY_LENGTH)
        .take(num_sensors)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ExperimentParams {
        ExperimentParams {
            num_sensors: 2,
            num_hidden: 0,
            num_motors: 2,
            world_width: 4,
            world_height: 8,
            task: vec![TaskCondition::new(1, "1___"), TaskCondition::new(-1, "11_1")],
            min_genome_length: 10,
            max_genome_length: 100,
            init_genome_length: 20,
            min_dup_del_width: 2,
            max_dup_del_width: 5,
            ..ExperimentParams::default()
        }
    }

    #[test]
    fn test_small_state_space() {
        let experiment = Experiment::derive(small()).unwrap();
        assert_eq!(experiment.num_nodes(), 4);
        assert_eq!(experiment.num_possible_states(), 16);
        assert_eq!(experiment.possible_states().len(), 16);
        assert_eq!(experiment.sensor_indices(), &[0, 1]);
        assert!(experiment.hidden_indices().is_empty());
        assert_eq!(experiment.motor_indices(), &[2, 3]);
        assert_eq!(experiment.sensor_motor_indices(), &[0, 1, 2, 3]);
        assert_eq!(experiment.num_trials(), 2 * 2 * 4);
        assert_eq!(experiment.hidden_powerset(), &[Vec::<usize>::new()]);
        assert_eq!(experiment.hidden_and_motor_powerset().len(), 4);
    }

    #[test]
    fn test_default_partitions() {
        let experiment = Experiment::derive(ExperimentParams::default()).unwrap();
        assert_eq!(experiment.hidden_indices(), &[2, 3, 4, 5]);
        assert_eq!(experiment.motor_indices(), &[6, 7]);
        assert_eq!(experiment.sensor_hidden_indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(experiment.hidden_motor_indices(), &[2, 3, 4, 5, 6, 7]);
        assert_eq!(experiment.hidden_powerset().len(), 16);
        assert_eq!(experiment.sensors_and_hidden_powerset().len(), 64);
        assert_eq!(experiment.num_hidden_states(), 16);
        assert_eq!(experiment.init_genome().len(), 5000);
    }

    #[test]
    fn test_block_patterns_are_reversed() {
        let experiment = Experiment::derive(small()).unwrap();
        // "1___" -> "0001" = 1, "11_1" -> "1011" = 11
        assert_eq!(experiment.block_patterns(), &[1, 11]);
        assert_eq!(experiment.hit_multipliers(), &[1, -1]);
    }

    #[test]
    fn test_sensor_locations() {
        assert_eq!(sensor_locations(2), vec![0, 2]);
        assert_eq!(sensor_locations(1), vec![0]);
        assert_eq!(sensor_locations(0), Vec::<usize>::new());
        assert_eq!(sensor_locations(3), vec![0, 1, 2]);
        assert_eq!(sensor_locations(5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sensor_motor_state_lookup() {
        let experiment = Experiment::derive(small()).unwrap();
        assert_eq!(experiment.sensor_motor_state(2, 1), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Experiment::derive(ExperimentParams::default()).unwrap();
        let b = Experiment::derive(ExperimentParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let params = ExperimentParams {
            deletion_prob: 1.5,
            ..small()
        };
        assert_eq!(
            Experiment::derive(params),
            Err(ValidationError::Probability {
                name: "deletion_prob",
                value: 1.5
            })
        );
        let params = ExperimentParams {
            mutation_prob: f64::NAN,
            ..small()
        };
        assert!(Experiment::derive(params).is_err());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let params = ExperimentParams {
            min_dup_del_width: 6,
            max_dup_del_width: 5,
            ..small()
        };
        assert!(matches!(
            Experiment::derive(params),
            Err(ValidationError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_tasks() {
        let empty = ExperimentParams { task: Vec::new(), ..small() };
        assert_eq!(Experiment::derive(empty), Err(ValidationError::EmptyTask));

        let ragged = ExperimentParams {
            task: vec![TaskCondition::new(1, "1___"), TaskCondition::new(-1, "11_")],
            ..small()
        };
        assert_eq!(
            Experiment::derive(ragged),
            Err(ValidationError::InconsistentTask {
                index: 1,
                width: 3,
                expected: 4
            })
        );

        let garbage = ExperimentParams {
            task: vec![TaskCondition::new(1, "1x__")],
            ..small()
        };
        assert!(matches!(
            Experiment::derive(garbage),
            Err(ValidationError::InvalidPattern(_))
        ));

        let too_wide = ExperimentParams {
            task: vec![TaskCondition::new(1, "1____")],
            ..small()
        };
        assert!(matches!(
            Experiment::derive(too_wide),
            Err(ValidationError::PatternWidth { .. })
        ));
    }

    #[test]
    fn test_rejects_unrepresentable_fitness() {
        let steep = ExperimentParams { nat_fit_base: 1e10, ..ExperimentParams::default() };
        assert!(matches!(
            Experiment::derive(steep),
            Err(ValidationError::FitnessOverflow { .. })
        ));
        // The default base overflows once the world is wide enough.
        let wide = ExperimentParams {
            world_width: MAX_WORLD_DIMENSION,
            ..ExperimentParams::default()
        };
        assert!(matches!(
            Experiment::derive(wide),
            Err(ValidationError::FitnessOverflow { .. })
        ));
        // Linear fitness never overflows.
        let linear = ExperimentParams {
            world_width: MAX_WORLD_DIMENSION,
            fitness_function: FitnessFunction::Linear,
            ..ExperimentParams::default()
        };
        assert!(Experiment::derive(linear).is_ok());
    }

    #[test]
    fn test_accepted_experiment_evaluates() {
        use crate::evolution::{Evaluator, LookupEvaluator};

        let experiment = Experiment::derive(ExperimentParams {
            nat_fit_base: 1.5,
            ..small()
        })
        .unwrap();
        let evaluation = LookupEvaluator
            .evaluate_genome(experiment.init_genome(), &experiment)
            .unwrap();
        assert!(evaluation.fitness.is_finite());
    }

    #[test]
    fn test_rejects_empty_world_and_population() {
        let world = ExperimentParams { world_height: 0, ..small() };
        assert!(matches!(Experiment::derive(world), Err(ValidationError::EmptyWorld { .. })));
        let population = ExperimentParams { popsize: 0, ..small() };
        assert_eq!(Experiment::derive(population), Err(ValidationError::EmptyPopulation));
        let huge = ExperimentParams { world_width: usize::MAX, ..small() };
        assert!(matches!(Experiment::derive(huge), Err(ValidationError::WorldTooLarge { .. })));
        let nodes = ExperimentParams { num_sensors: usize::MAX, ..small() };
        assert!(matches!(Experiment::derive(nodes), Err(ValidationError::TooManyNodes { .. })));
    }

    #[test]
    fn test_rejects_out_of_bounds_seed_genome() {
        let params = ExperimentParams {
            init_genome: Some(vec![1, 2, 3]),
            ..small()
        };
        assert_eq!(
            Experiment::derive(params),
            Err(ValidationError::InitialGenomeLength {
                length: 3,
                min: 10,
                max: 100
            })
        );
    }

    #[test]
    fn test_serializes_primary_parameters_only() {
        let experiment = Experiment::derive(small()).unwrap();
        let json = serde_json::to_string(&experiment).unwrap();
        assert!(!json.contains("possible_states"));
        assert!(json.contains("\"task\":[[1,\"1___\"],[-1,\"11_1\"]]"));
        let restored: Experiment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, experiment);
    }

    #[test]
    fn test_invalid_params_fail_deserialization() {
        let json = r#"{"popsize": 0}"#;
        assert!(serde_json::from_str::<Experiment>(json).is_err());
    }

    #[test]
    fn test_load_sectioned_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");
        std::fs::write(&path, r#"{"experiment": {"popsize": 7, "ngen": 3}}"#).unwrap();
        let experiment = Experiment::load(&path).unwrap();
        assert_eq!(experiment.params().popsize, 7);
        assert_eq!(experiment.params().ngen, 3);
        assert_eq!(experiment.params().num_hidden, 4);
    }

    #[test]
    fn test_missing_experiment_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_params(&path).unwrap_err();
        assert!(matches!(err, EvolutionError::ExperimentIo { .. }));
        assert!(err.to_string().starts_with("failed to read experiment file"));
    }
}
