//! Probing the host toolchain.
//!
//! Flags are probed first, each on top of those already accepted. Headers
//! are then checked against the final flag set.

pub mod flags;
pub mod headers;

pub use flags::{CandidateFlag, FlagProber, FlagSet, DEFAULT_TRIAL_SOURCE};
pub use headers::{have_macro, HeaderProber, HeaderResult};

/// Result of a single probe. A rejection carries no error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Accepted,
    Rejected,
}

impl ProbeOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            ProbeOutcome::Accepted
        } else {
            ProbeOutcome::Rejected
        }
    }

    pub fn is_accepted(self) -> bool {
        self == ProbeOutcome::Accepted
    }
}
