//! Run command implementation.

use super::{evolve, CliError, ParamArgs, RunArgs};
use animats::evolution::{check_output_path, write_output, Evolution, LookupEvaluator, RunSettings};
use animats::experiment::{load_params, Experiment};
use std::path::Path;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the output exists without `--overwrite`, the
/// experiment is invalid, or the run fails.
pub(crate) fn execute(
    experiment: &Path,
    output: &Path,
    params: &ParamArgs,
    run: &RunArgs,
) -> Result<(), CliError> {
    // Fail before simulating rather than after
    check_output_path(output, run.overwrite)?;

    let mut experiment_params = load_params(experiment)?;
    params.apply(&mut experiment_params)?;
    let experiment = Experiment::derive(experiment_params)?;
    log::debug!(
        "parameters: {}",
        serde_json::to_string(experiment.params()).unwrap_or_default()
    );

    run.configure_threads();
    let settings = run.settings(RunSettings::default());
    log::info!("simulating {} generations", experiment.params().ngen);
    let mut evolution = Evolution::new(experiment, settings, LookupEvaluator)?;
    evolve(&mut evolution, run.progress)?;

    write_output(&evolution.output(), output, run.overwrite)?;
    log::info!("wrote {}", output.display());
    Ok(())
}
