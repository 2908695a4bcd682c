//! High-level operations.
//!
//! This module contains the implementation of extconf commands.

pub mod configure;
pub mod errors;

pub use configure::{
    configure, configure_with, probe, ConfigureOptions, ConfigureResult, ProbeOptions,
    ProbeReport,
};
pub use errors::ConfigureError;
