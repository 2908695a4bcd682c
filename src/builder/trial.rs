//! Trial compilation.
//!
//! A trial runs the compiler on a small source fragment only to learn
//! whether the toolchain accepts it. Every trial gets its own temporary
//! directory, removed when the trial returns on any path.

use std::io;

use thiserror::Error;

use super::toolchain::{Toolchain, ToolchainUnavailable, TrialInput, TrialMode};
use crate::util::process::ProcessBuilder;

/// Name of the trial source inside the temporary workspace.
const TRIAL_SOURCE: &str = "conftest.c";

/// Error that aborts probing. A rejected trial is never an error.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    ToolchainUnavailable(#[from] ToolchainUnavailable),

    #[error("failed to prepare trial workspace: {0}")]
    Workspace(#[source] io::Error),
}

/// One trial compile request.
#[derive(Debug, Clone, Copy)]
pub struct TrialRequest<'a> {
    /// C source of the trial program
    pub source: &'a str,
    /// Flags to pass after the toolchain defaults
    pub flags: &'a [String],
    pub mode: TrialMode,
}

/// Result of a trial that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct TrialOutput {
    /// Whether the compiler exited successfully
    pub success: bool,
    /// Captured compiler diagnostics
    pub stderr: String,
    /// The object file or preprocessed text, when produced
    pub artifact: Vec<u8>,
}

/// The trial-compile interface.
pub trait TrialCompiler {
    fn compile(&self, request: &TrialRequest<'_>) -> Result<TrialOutput, ProbeError>;
}

/// Trial compiler backed by a real toolchain.
pub struct ToolchainCompiler<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> ToolchainCompiler<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        ToolchainCompiler { toolchain }
    }
}

impl TrialCompiler for ToolchainCompiler<'_> {
    fn compile(&self, request: &TrialRequest<'_>) -> Result<TrialOutput, ProbeError> {
        let workspace = tempfile::Builder::new()
            .prefix("extconf-trial")
            .tempdir()
            .map_err(ProbeError::Workspace)?;

        let source = workspace.path().join(TRIAL_SOURCE);
        std::fs::write(&source, request.source).map_err(ProbeError::Workspace)?;

        let output = workspace.path().join(match request.mode {
            TrialMode::Compile => "conftest.o",
            TrialMode::Preprocess => "conftest.i",
        });

        let mut flags = self.toolchain.default_cflags().to_vec();
        flags.extend(request.flags.iter().cloned());

        let input = TrialInput {
            source,
            output: output.clone(),
            flags,
            mode: request.mode,
        };

        let pb = ProcessBuilder::from_spec(&self.toolchain.trial_command(&input))
            .cwd(workspace.path());
        tracing::debug!("trial: {}", pb.display_command());

        let result = pb.exec().map_err(|e| {
            ToolchainUnavailable::new(
                Some(self.toolchain.compiler_path().to_path_buf()),
                format!("{:#}", e),
            )
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let success = result.status.success();
        if !success {
            tracing::debug!("trial failed ({:?}):\n{}", result.status.code(), stderr.trim_end());
        }

        let artifact = if success {
            std::fs::read(&output).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(TrialOutput {
            success,
            stderr,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::builder::toolchain::{GccToolchain, ToolchainPlatform};

    fn host_toolchain() -> Option<GccToolchain> {
        let cc = crate::util::process::find_c_compiler()?;
        Some(GccToolchain::new(cc, ToolchainPlatform::Gcc))
    }

    #[test]
    fn test_trial_compiles_minimal_program() {
        let Some(tc) = host_toolchain() else {
            return;
        };
        let compiler = ToolchainCompiler::new(&tc);

        let out = compiler
            .compile(&TrialRequest {
                source: "int main(void) { return 0; }\n",
                flags: &[],
                mode: TrialMode::Compile,
            })
            .unwrap();
        assert!(out.success, "stderr: {}", out.stderr);
        assert!(!out.artifact.is_empty());
    }

    #[test]
    fn test_trial_rejects_broken_source() {
        let Some(tc) = host_toolchain() else {
            return;
        };
        let compiler = ToolchainCompiler::new(&tc);

        let out = compiler
            .compile(&TrialRequest {
                source: "this is not C\n",
                flags: &[],
                mode: TrialMode::Compile,
            })
            .unwrap();
        assert!(!out.success);
        assert!(out.artifact.is_empty());
    }

    #[test]
    fn test_missing_compiler_is_unavailable() {
        let tc = GccToolchain::new(
            PathBuf::from("/nonexistent/extconf-cc"),
            ToolchainPlatform::Gcc,
        );
        let compiler = ToolchainCompiler::new(&tc);

        let err = compiler
            .compile(&TrialRequest {
                source: "",
                flags: &[],
                mode: TrialMode::Compile,
            })
            .unwrap_err();
        assert!(matches!(err, ProbeError::ToolchainUnavailable(_)));
    }
}
