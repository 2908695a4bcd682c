//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use super::{CommandSpec, Toolchain, ToolchainPlatform, TrialInput, TrialMode};

/// Flags every module is built with when nothing else is configured.
const DEFAULT_OPT_FLAGS: &[&str] = &["-O2"];

/// GCC/Clang toolchain (Unix-like systems).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Arguments that are part of the compiler command itself (`CC="ccache gcc"`)
    pub cc_args: Vec<String>,
    /// Compiler family (gcc, clang, apple-clang)
    pub family: ToolchainPlatform,
    cflags: Vec<String>,
    ldflags: Vec<String>,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain with the default flags.
    pub fn new(cc: PathBuf, family: ToolchainPlatform) -> Self {
        GccToolchain {
            cc,
            cc_args: Vec::new(),
            family,
            cflags: default_cflags(&[]),
            ldflags: Vec::new(),
        }
    }

    /// Set the leading compiler arguments.
    pub fn with_cc_args(mut self, args: Vec<String>) -> Self {
        self.cc_args = args;
        self
    }

    /// Replace the optimization flags. `-fPIC` is always kept in front.
    pub fn with_cflags(mut self, cflags: &[String]) -> Self {
        self.cflags = default_cflags(cflags);
        self
    }

    pub fn with_ldflags(mut self, ldflags: Vec<String>) -> Self {
        self.ldflags = ldflags;
        self
    }
}

fn default_cflags(configured: &[String]) -> Vec<String> {
    let mut flags = vec!["-fPIC".to_string()];
    if configured.is_empty() {
        flags.extend(DEFAULT_OPT_FLAGS.iter().map(|f| f.to_string()));
    } else {
        flags.extend(configured.iter().filter(|f| *f != "-fPIC").cloned());
    }
    flags
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> ToolchainPlatform {
        self.family
    }

    fn compiler_path(&self) -> &Path {
        &self.cc
    }

    fn compiler_command_line(&self) -> String {
        let mut parts = vec![self.cc.display().to_string()];
        parts.extend(self.cc_args.iter().cloned());
        parts.join(" ")
    }

    fn default_cflags(&self) -> &[String] {
        &self.cflags
    }

    fn ldflags(&self) -> &[String] {
        &self.ldflags
    }

    fn trial_command(&self, input: &TrialInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cc).args(self.cc_args.iter().cloned());

        cmd = cmd.args(input.flags.iter().cloned());

        cmd = match input.mode {
            TrialMode::Compile => cmd.arg("-c"),
            TrialMode::Preprocess => cmd.arg("-E"),
        };

        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        // Keep diagnostics stable and untranslated
        cmd.env("LC_ALL", "C")
    }

    fn ldshared(&self) -> String {
        match self.family {
            ToolchainPlatform::AppleClang => "$(CC) -dynamic -bundle -undefined dynamic_lookup",
            ToolchainPlatform::Gcc | ToolchainPlatform::Clang => "$(CC) -shared",
        }
        .to_string()
    }

    fn object_extension(&self) -> &str {
        "o"
    }

    fn module_extension(&self) -> &str {
        match self.family {
            ToolchainPlatform::AppleClang => "bundle",
            ToolchainPlatform::Gcc | ToolchainPlatform::Clang => "so",
        }
    }
}
