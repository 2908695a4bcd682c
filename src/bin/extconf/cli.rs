//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use extconf::util::shell::ColorChoice;

/// extconf - Probe the C toolchain and generate a native extension Makefile
#[derive(Parser)]
#[command(name = "extconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the toolchain and write the Makefile
    Generate(GenerateArgs),

    /// Probe the toolchain and print the results
    Probe(ProbeArgs),
}

impl Commands {
    /// Whether the command asked for JSON output.
    pub fn is_json(&self) -> bool {
        match self {
            Commands::Generate(_) => false,
            Commands::Probe(args) => args.message_format == MessageFormat::Json,
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Module name, e.g. encoding/character/utf-8/utf8 (defaults to the manifest's)
    pub module: Option<String>,

    /// Path to extconf.toml (defaults to <srcdir>/extconf.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the module sources
    #[arg(long, default_value = ".")]
    pub srcdir: PathBuf,

    /// Where to write the Makefile
    #[arg(short, long, default_value = "Makefile")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Path to extconf.toml (defaults to <srcdir>/extconf.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the module sources
    #[arg(long, default_value = ".")]
    pub srcdir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}
