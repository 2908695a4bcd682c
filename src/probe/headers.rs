//! Header presence probing.

use serde::Serialize;

use crate::builder::toolchain::TrialMode;
use crate::builder::trial::{ProbeError, TrialCompiler, TrialRequest};
use crate::util::Shell;

use super::flags::FlagSet;

/// Outcome of checking one header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderResult {
    name: String,
    present: bool,
}

impl HeaderResult {
    pub fn new(name: impl Into<String>, present: bool) -> Self {
        HeaderResult {
            name: name.into(),
            present,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// The preprocessor symbol announcing this header, if it is present.
    pub fn capability(&self) -> Option<String> {
        self.present.then(|| have_macro(&self.name))
    }
}

/// Macro name for a header: `sys/types.h` -> `HAVE_SYS_TYPES_H`.
pub fn have_macro(header: &str) -> String {
    let mut name = String::from("HAVE_");
    name.extend(header.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    name
}

/// Checks headers with the flag set fixed at construction.
///
/// Header checks never change the compile context, so one header's
/// result cannot influence another's.
pub struct HeaderProber<'a, C: TrialCompiler + ?Sized> {
    compiler: &'a C,
    shell: &'a Shell,
    flags: &'a FlagSet,
}

impl<'a, C: TrialCompiler + ?Sized> HeaderProber<'a, C> {
    pub fn new(compiler: &'a C, shell: &'a Shell, flags: &'a FlagSet) -> Self {
        HeaderProber {
            compiler,
            shell,
            flags,
        }
    }

    /// Check whether `header` can be included.
    pub fn check(&self, header: &str) -> Result<HeaderResult, ProbeError> {
        let source = format!("#include <{}>\n", header);

        let output = self.compiler.compile(&TrialRequest {
            source: &source,
            flags: self.flags.as_slice(),
            mode: TrialMode::Preprocess,
        })?;

        tracing::debug!("header {} -> {}", header, output.success);
        self.shell.probe_result("header", header, output.success);

        Ok(HeaderResult::new(header, output.success))
    }

    /// Check each header in order; one result per header.
    pub fn check_all(&self, headers: &[String]) -> Result<Vec<HeaderResult>, ProbeError> {
        headers.iter().map(|h| self.check(h)).collect()
    }
}
