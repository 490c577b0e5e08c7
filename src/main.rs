//! Animats CLI - evolve animats and resume interrupted runs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Animats - evolve animats with a genetic algorithm
#[derive(Parser, Debug)]
#[command(name = "animats")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve a population from an experiment file
    Run {
        /// Experiment file (JSON; missing parameters take their defaults)
        #[arg(required = true)]
        experiment: PathBuf,

        /// Output file (JSON)
        #[arg(required = true)]
        output: PathBuf,

        #[command(flatten)]
        params: cli::ParamArgs,

        #[command(flatten)]
        run: cli::RunArgs,
    },

    /// Continue a run from a checkpoint
    Resume {
        /// Checkpoint file written by an earlier run
        #[arg(required = true)]
        checkpoint: PathBuf,

        /// Output file (JSON)
        #[arg(required = true)]
        output: PathBuf,

        /// Total number of generations (default: the checkpoint's)
        #[arg(short = 'n', long)]
        num_gen: Option<u64>,

        #[command(flatten)]
        run: cli::RunArgs,
    },

    /// List the available fitness functions
    FitnessFunctions,

    /// Print the default experiment as JSON
    Example,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            experiment,
            output,
            params,
            run,
        } => cli::run::execute(&experiment, &output, &params, &run),

        Commands::Resume {
            checkpoint,
            output,
            num_gen,
            run,
        } => cli::resume::execute(&checkpoint, &output, num_gen, &run),

        Commands::FitnessFunctions => {
            print!("{}", cli::output::format_fitness_functions());
            Ok(())
        }

        Commands::Example => cli::output::format_example().map(|json| println!("{json}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
