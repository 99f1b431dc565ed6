use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;
mod domain;
mod services;

pub use cli::*;
pub use context::Context;
pub use domain::errors::GraftError;
pub use domain::models::*;
pub use services::output::*;

use commands::{handle_instrument_commands, handle_setup_commands};

const LOG_ENV: &str = "GRAFT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(cli)?;
    if handle_setup_commands(cli, &ctx)? {
        return Ok(());
    }
    if handle_instrument_commands(cli, &ctx)? {
        return Ok(());
    }
    anyhow::bail!("unhandled command: {:?}", cli.command)
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(err) = run(&cli) {
        print_error(cli.json, &err);
        std::process::exit(1);
    }
}
