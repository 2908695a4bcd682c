//! `extconf probe` command

use anyhow::Result;

use crate::cli::ProbeArgs;
use extconf::ops::configure::{probe, ProbeOptions};
use extconf::util::Shell;

pub fn execute(args: ProbeArgs, shell: &Shell) -> Result<()> {
    let opts = ProbeOptions {
        srcdir: args.srcdir,
        config: args.config,
    };

    probe(&opts, shell)?;
    Ok(())
}
