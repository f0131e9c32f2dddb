//! Command-line entry point for the concolic engine (C10, §4.10, §6).
//!
//! Parses the flags, validates them into an [`concolic_core::EngineConfig`],
//! wires up structured logging at the requested verbosity (C11, §4.11),
//! and hands off to the main loop. Exit codes follow §6: `0` on a clean
//! shutdown (queue drained or time budget expired), non-zero on a
//! configuration error or an internal invariant failure.

mod cli;
mod engine;
mod error;
mod validate;

use clap::Parser;

use cli::Args;

const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_ENGINE_ERROR: i32 = 2;

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    let verbosity = args.verbosity;

    let config = match args.into_engine_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    init_logging(verbosity);

    if let Err(err) = validate::validate(&config) {
        tracing::error!(%err, "startup validation failed");
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    tracing::info!(
        program = %config.program.display(),
        output_dir = %config.output_dir.display(),
        architecture = config.architecture.as_str(),
        n_spawn = config.n_spawn,
        n_solve = config.n_solve,
        "starting concolic engine"
    );

    if let Err(err) = engine::run(&config) {
        tracing::error!(error = %err, "engine run aborted");
        std::process::exit(EXIT_ENGINE_ERROR);
    }
}
