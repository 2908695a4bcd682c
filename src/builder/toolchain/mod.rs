//! Toolchain abstraction for the host C compiler.
//!
//! The toolchain turns trial requests into concrete compiler commands and
//! supplies the defaults that every generated Makefile starts from.
//!
//! Toolchain detection priority:
//! 1. Toolchain config file (`.extconf/toolchain.toml` or `~/.extconf/toolchain.toml`)
//! 2. The `CC` environment variable
//! 3. Auto-detection (searching PATH for cc, gcc, clang)

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

mod detect;
mod gcc;

pub use detect::detect_toolchain;
pub use gcc::GccToolchain;

/// The compiler could not be located or invoked at all.
///
/// This is the one fatal condition of probing: a compiler that runs and
/// rejects a trial is a negative result, not an error.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("C compiler unavailable: {reason}")]
#[diagnostic(
    code(extconf::toolchain::unavailable),
    help("set CC or add `cc = \"...\"` to .extconf/toolchain.toml")
)]
pub struct ToolchainUnavailable {
    /// The program that was looked up or spawned, if one was chosen
    pub program: Option<PathBuf>,
    /// Why it could not be used
    pub reason: String,
}

impl ToolchainUnavailable {
    pub fn new(program: Option<PathBuf>, reason: impl Into<String>) -> Self {
        ToolchainUnavailable {
            program,
            reason: reason.into(),
        }
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// How far a trial runs the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialMode {
    /// Compile to an object file (`-c`).
    Compile,
    /// Run the preprocessor only (`-E`).
    Preprocess,
}

/// Input for a single trial invocation.
#[derive(Debug, Clone)]
pub struct TrialInput {
    /// Trial source file
    pub source: PathBuf,
    /// Where the compiler writes its output
    pub output: PathBuf,
    /// Flags in command-line order, defaults first
    pub flags: Vec<String>,
    pub mode: TrialMode,
}

/// The family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainPlatform {
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Clang/LLVM
    Clang,
    /// Apple Clang (macOS)
    AppleClang,
}

impl ToolchainPlatform {
    /// Get the platform name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
            ToolchainPlatform::AppleClang => "apple-clang",
        }
    }
}

/// Trait for toolchain implementations.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain platform.
    fn platform(&self) -> ToolchainPlatform;

    /// Get the C compiler path.
    fn compiler_path(&self) -> &Path;

    /// The compiler as written into a Makefile (program plus any leading
    /// arguments, e.g. `ccache gcc`).
    fn compiler_command_line(&self) -> String;

    /// Flags that precede every probed flag and open the generated
    /// `CFLAGS` directive.
    fn default_cflags(&self) -> &[String];

    /// Flags used when linking the module.
    fn ldflags(&self) -> &[String];

    /// Generate the command for a trial compile or preprocess.
    fn trial_command(&self, input: &TrialInput) -> CommandSpec;

    /// Driver invocation that links a loadable module, without inputs.
    fn ldshared(&self) -> String;

    /// Get the object file extension.
    fn object_extension(&self) -> &str;

    /// Get the extension of a loadable module.
    fn module_extension(&self) -> &str;
}
