//! Fatal configure errors and their diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::builder::toolchain::ToolchainUnavailable;
use crate::builder::trial::ProbeError;
use crate::core::install::ManifestError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// An error that aborts a configure run before any Makefile is written.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("toolchain: {0}")]
    ToolchainUnavailable(#[from] ToolchainUnavailable),

    #[error("probe: failed to prepare trial workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("config: {message}")]
    Config { path: PathBuf, message: String },
}

impl From<ProbeError> for ConfigureError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::ToolchainUnavailable(e) => ConfigureError::ToolchainUnavailable(e),
            ProbeError::Workspace(e) => ConfigureError::Workspace(e),
        }
    }
}

impl ConfigureError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ConfigureError::ToolchainUnavailable(_) => "toolchain",
            ConfigureError::Workspace(_) => "probe",
            ConfigureError::Manifest(_) => "manifest",
            ConfigureError::Config { .. } => "config",
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let stage = format!("stage: {}", self.stage());

        match self {
            ConfigureError::ToolchainUnavailable(e) => {
                let mut diag = Diagnostic::error(e.to_string()).with_context(stage);
                if let Some(program) = &e.program {
                    diag = diag.with_context(format!("compiler: {}", program.display()));
                }
                diag.with_suggestion(suggestions::NO_COMPILER)
            }

            ConfigureError::Workspace(e) => {
                Diagnostic::error(format!("failed to prepare trial workspace: {}", e))
                    .with_context(stage)
            }

            ConfigureError::Manifest(ManifestError::MissingSource {
                source_file,
                search_dir,
                group,
            }) => Diagnostic::error(format!(
                "install source `{}` not found",
                source_file.display()
            ))
            .with_context(stage)
            .with_context(format!("searched in: {}", search_dir.display()))
            .with_context(format!("install group: {}", group))
            .with_suggestion(suggestions::MISSING_INSTALL_SOURCE),

            ConfigureError::Manifest(ManifestError::DuplicateDestination { dest, .. }) => {
                Diagnostic::error(format!("more than one install entry writes {}", dest))
                    .with_context(stage)
                    .with_context(self.to_string())
                    .with_suggestion(suggestions::DUPLICATE_INSTALL_DESTINATION)
            }

            ConfigureError::Manifest(e @ ManifestError::InvalidModuleName { .. }) => {
                Diagnostic::error(e.to_string()).with_context(stage)
            }

            ConfigureError::Config { path, message } => Diagnostic::error(message.clone())
                .with_location(path)
                .with_context(stage)
                .with_suggestion(suggestions::BAD_CONFIG),
        }
    }
}
