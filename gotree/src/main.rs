// gotree/src/main.rs
use std::env;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use gotree_common::config::Config;
use gotree_common::error::{GoTreeError, Result};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

fn parse_args() -> CliArgs {
    match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Usage errors exit with 1, never reaching the resolver.
            let _ = e.print();
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("GOTREE_LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

fn run(cli_args: &CliArgs) -> Result<()> {
    let config = Config::load()?.with_build_tags(cli_args.tags.iter().cloned());

    let work_dir = env::current_dir().map_err(|e| {
        GoTreeError::Config(format!("Could not determine the current directory: {e}"))
    })?;
    debug!("Working directory: {}", work_dir.display());

    cli_args.run(config, &work_dir)
}

fn main() {
    let cli_args = parse_args();
    init_logging(cli_args.verbose);

    if let Err(e) = run(&cli_args) {
        debug!("Command failed: {:?}", e);
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }

    debug!("Command completed successfully.");
}
