//! Pushlink CLI Binary
//!
//! Diagnostic command-line interface for the Pushlink messaging core.

use anyhow::Context;
use clap::Parser;
use pushlink::cli::{execute, Cli};
use pushlink::logging::init_logging;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = cli.load_config().context("Failed to load configuration")?;
    let logging = cli.logging_config(&config);
    init_logging(Some(&logging)).context("Failed to initialize logging")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let output = runtime.block_on(execute(&cli.command, &config))?;
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
