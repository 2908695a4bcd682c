//! `extconf generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use extconf::ops::configure::{configure, ConfigureOptions};
use extconf::util::Shell;

pub fn execute(args: GenerateArgs, shell: &Shell) -> Result<()> {
    let opts = ConfigureOptions {
        srcdir: args.srcdir,
        config: args.config,
        module: args.module,
        output: args.output,
    };

    let result = configure(&opts, shell)?;
    tracing::debug!("wrote {}", result.makefile.display());

    Ok(())
}
