use clap::Parser;
use parley::{cli::Cli, config};
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> parley::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.history_dir {
        config.history.dir = dir;
    }

    parley::run_command(cli.command.unwrap_or_default(), config)
}
