mod cli;
mod config;
mod platform;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, LogDestination, DEFAULT_LOG_FILE};
use harvester_engine::EngineHandle;
use log::LevelFilter;

use cli::Cli;
use config::HarvesterConfig;
use platform::Launch;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("An error occurred: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = HarvesterConfig::load(cli.config.as_deref())?;

    // Info lines would break up the progress bar unless they go to a file.
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if config.log_to_file {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    let destination = match (config.log_to_file, cli.verbose) {
        (true, true) => LogDestination::both_default(),
        (true, false) => LogDestination::File(DEFAULT_LOG_FILE.into()),
        (false, _) => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level);

    let engine_config = config.engine_config()?;
    let engine = EngineHandle::new(engine_config).context("failed to start the harvest engine")?;

    let launch = Launch {
        query: cli.query,
        count: cli.count,
        destination: cli.output.or(config.default_output_dir),
    };
    platform::run_app(engine, launch).context("terminal front end failed")
}
