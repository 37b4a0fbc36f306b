//! insert-wb
//!
//! Reads C sources, finds stores of collector-tracked references into heap
//! objects, and prints each file with a write barrier inserted before every
//! such store.

mod cli;
mod run;

use clap::Parser;
use cli::Cli;
use env_logger::Env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let stdout = io::stdout();
    match run::run(&cli, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("insert-wb: error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
