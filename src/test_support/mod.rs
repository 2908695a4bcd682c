//! Test doubles for probing without a real compiler.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::builder::toolchain::{ToolchainUnavailable, TrialMode};
use crate::builder::trial::{ProbeError, TrialCompiler, TrialOutput, TrialRequest};

/// A recorded call to [`MockCompiler::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub source: String,
    pub flags: Vec<String>,
    pub mode: TrialMode,
}

/// Scripted trial compiler.
///
/// A trial succeeds when every flag is in the accepted set, no declared
/// conflicting pair appears together, and every `#include <...>` names a
/// provided header.
#[derive(Debug, Default)]
pub struct MockCompiler {
    accepted: HashSet<String>,
    headers: HashSet<String>,
    conflicts: Vec<(String, String)>,
    unavailable: bool,
    calls: RefCell<Vec<Invocation>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiler that cannot be spawned.
    pub fn unavailable() -> Self {
        MockCompiler {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn accept_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn provide_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(Into::into));
        self
    }

    /// Make trials fail whenever both flags are passed together.
    pub fn conflict(mut self, a: &str, b: &str) -> Self {
        self.conflicts.push((a.to_string(), b.to_string()));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    fn included_headers(source: &str) -> impl Iterator<Item = &str> {
        source.lines().filter_map(|line| {
            line.trim()
                .strip_prefix("#include <")
                .and_then(|rest| rest.strip_suffix('>'))
        })
    }
}

impl TrialCompiler for MockCompiler {
    fn compile(&self, request: &TrialRequest<'_>) -> Result<TrialOutput, ProbeError> {
        if self.unavailable {
            return Err(ToolchainUnavailable::new(
                Some(PathBuf::from("mock-cc")),
                "failed to spawn `mock-cc`",
            )
            .into());
        }

        self.calls.borrow_mut().push(Invocation {
            source: request.source.to_string(),
            flags: request.flags.to_vec(),
            mode: request.mode,
        });

        let flags_ok = request.flags.iter().all(|f| self.accepted.contains(f));
        let no_conflict = !self.conflicts.iter().any(|(a, b)| {
            request.flags.contains(a) && request.flags.contains(b)
        });
        let headers_ok = Self::included_headers(request.source).all(|h| self.headers.contains(h));

        let success = flags_ok && no_conflict && headers_ok;
        Ok(TrialOutput {
            success,
            stderr: if success {
                String::new()
            } else {
                "mock-cc: error: trial rejected".to_string()
            },
            artifact: if success { b"\x7fELF".to_vec() } else { Vec::new() },
        })
    }
}
