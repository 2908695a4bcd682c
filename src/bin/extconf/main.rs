//! extconf CLI - configures a native extension module for the host C toolchain

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use extconf::ops::ConfigureError;
use extconf::util::diagnostic;
use extconf::util::Shell;

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("extconf=debug")
    } else if cli.quiet {
        EnvFilter::new("extconf=warn")
    } else {
        EnvFilter::new("extconf=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color, cli.command.is_json());

    if let Err(e) = run(cli.command, &shell) {
        report_error(&e, &shell);
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Generate(args) => commands::generate::execute(args, shell),
        Commands::Probe(args) => commands::probe::execute(args, shell),
    }
}

fn report_error(err: &anyhow::Error, shell: &Shell) {
    if shell.is_json() {
        shell.error(format_args!("{:#}", err));
        return;
    }

    match err.downcast_ref::<ConfigureError>() {
        Some(configure_err) => diagnostic::emit(&configure_err.to_diagnostic(), shell.use_color()),
        None => eprintln!("error: {:#}", err),
    }
}
