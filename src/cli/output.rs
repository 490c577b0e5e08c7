//! Output formatting utilities for CLI.

use super::CliError;
use animats::evolution::FitnessFunction;
use animats::ExperimentParams;
use std::fmt::Write;

/// Format the fitness function listing.
pub(crate) fn format_fitness_functions() -> String {
    let width = FitnessFunction::ALL
        .iter()
        .map(|f| f.name().len())
        .max()
        .unwrap_or(0);
    let mut output = String::from("Fitness functions:\n");
    for function in FitnessFunction::ALL {
        // Writing to a String cannot fail
        let _ = writeln!(output, "  {:<width$}  {}", function.name(), function.description());
    }
    output
}

/// Format the default experiment as pretty JSON, ready to edit and pass to
/// `run`.
pub(crate) fn format_example() -> Result<String, CliError> {
    serde_json::to_string_pretty(&ExperimentParams::default())
        .map_err(|e| CliError::new(format!("failed to serialize example: {e}")))
}
