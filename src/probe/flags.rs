//! Compiler flag probing.
//!
//! Each candidate flag is tried on top of every flag accepted before it.
//! An accepted flag stays in effect for all later probes, so the outcome
//! of a probe can depend on the order of the candidate list.

use serde::{Deserialize, Serialize};

use crate::builder::toolchain::TrialMode;
use crate::builder::trial::{ProbeError, TrialCompiler, TrialRequest};
use crate::util::Shell;

use super::ProbeOutcome;

/// Trial program used when a candidate brings no source of its own.
pub const DEFAULT_TRIAL_SOURCE: &str = "int main(void) { return 0; }\n";

/// A compiler flag to probe, optionally with its own trial program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFlag {
    pub flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CandidateFlag {
    pub fn new(flag: impl Into<String>) -> Self {
        CandidateFlag {
            flag: flag.into(),
            source: None,
        }
    }

    /// Probe the flag against a custom trial program.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn trial_source(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_TRIAL_SOURCE)
    }
}

impl From<&str> for CandidateFlag {
    fn from(flag: &str) -> Self {
        CandidateFlag::new(flag)
    }
}

/// Accepted flags in probing order.
///
/// Append-only and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    pub fn new() -> Self {
        FlagSet(Vec::new())
    }

    /// Append `flag` unless it is already present.
    pub fn with(mut self, flag: &str) -> Self {
        if !self.contains(flag) {
            self.0.push(flag.to_string());
        }
        self
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f == flag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Probes candidate flags against a trial compiler.
pub struct FlagProber<'a, C: TrialCompiler + ?Sized> {
    compiler: &'a C,
    shell: &'a Shell,
}

impl<'a, C: TrialCompiler + ?Sized> FlagProber<'a, C> {
    pub fn new(compiler: &'a C, shell: &'a Shell) -> Self {
        FlagProber { compiler, shell }
    }

    /// Probe one flag on top of `accepted`.
    ///
    /// Returns the (possibly extended) flag set and the outcome. Only a
    /// toolchain that cannot be run at all is an error.
    pub fn probe(
        &self,
        accepted: FlagSet,
        candidate: &CandidateFlag,
    ) -> Result<(FlagSet, ProbeOutcome), ProbeError> {
        let mut flags = accepted.as_slice().to_vec();
        flags.push(candidate.flag.clone());

        let output = self.compiler.compile(&TrialRequest {
            source: candidate.trial_source(),
            flags: &flags,
            mode: TrialMode::Compile,
        })?;

        let outcome = ProbeOutcome::from_success(output.success);
        tracing::debug!("flag {} -> {:?}", candidate.flag, outcome);
        self.shell
            .probe_result("flag", &candidate.flag, outcome.is_accepted());

        let accepted = match outcome {
            ProbeOutcome::Accepted => accepted.with(&candidate.flag),
            ProbeOutcome::Rejected => accepted,
        };
        Ok((accepted, outcome))
    }

    /// Probe every candidate in order, folding accepted flags into the
    /// context of the next probe.
    pub fn probe_all(&self, candidates: &[CandidateFlag]) -> Result<FlagSet, ProbeError> {
        candidates
            .iter()
            .try_fold(FlagSet::new(), |accepted, candidate| {
                self.probe(accepted, candidate).map(|(next, _)| next)
            })
    }
}
