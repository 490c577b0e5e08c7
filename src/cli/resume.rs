//! Resume command implementation.

use super::{evolve, CliError, RunArgs};
use animats::evolution::{
    check_output_path, load_checkpoint, write_output, Evolution, LookupEvaluator,
};
use std::path::Path;

/// Execute the resume command.
///
/// Recording options not given on the command line keep the values stored
/// in the checkpoint.
///
/// # Errors
///
/// Returns an error if the output exists without `--overwrite`, the
/// checkpoint cannot be loaded, or the run fails.
pub(crate) fn execute(
    checkpoint: &Path,
    output: &Path,
    num_gen: Option<u64>,
    run: &RunArgs,
) -> Result<(), CliError> {
    check_output_path(output, run.overwrite)?;

    let mut state = load_checkpoint(checkpoint)?;
    if let Some(ngen) = num_gen {
        state.params.ngen = ngen;
    }
    if state.params.ngen <= state.generation {
        log::info!(
            "checkpoint is at generation {}; no generations left to simulate",
            state.generation
        );
    }

    run.configure_threads();
    let settings = run.settings(state.settings.clone());
    let mut evolution = Evolution::resume(state, settings, LookupEvaluator)?;
    evolve(&mut evolution, run.progress)?;

    write_output(&evolution.output(), output, run.overwrite)?;
    log::info!("wrote {}", output.display());
    Ok(())
}
