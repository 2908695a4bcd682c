//! extconf - configures a native extension module for the host C toolchain
//!
//! This crate probes which compiler flags and headers the host toolchain
//! accepts and generates the Makefile that builds and installs the module.

pub mod builder;
pub mod core;
pub mod ops;
pub mod probe;
pub mod util;

/// Test utilities for extconf unit tests.
///
/// Provides a scripted trial compiler so probing can be tested without
/// a real C toolchain.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{InstallManifest, Manifest};
pub use ops::ConfigureError;
pub use probe::{FlagSet, HeaderResult, ProbeOutcome};
