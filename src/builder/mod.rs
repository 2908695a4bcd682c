//! Trial compilation and build descriptor generation.

pub mod descriptor;
pub mod makefile;
pub mod toolchain;
pub mod trial;

pub use descriptor::{BuildDescriptor, DescriptorGenerator, InstallRule, ModuleName};
pub use makefile::Makefile;
pub use toolchain::{
    detect_toolchain, CommandSpec, GccToolchain, Toolchain, ToolchainPlatform,
    ToolchainUnavailable, TrialMode,
};
pub use trial::{ProbeError, ToolchainCompiler, TrialCompiler, TrialOutput, TrialRequest};
