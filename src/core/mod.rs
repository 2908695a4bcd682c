//! Project configuration: the module manifest and its install entries.

pub mod defaults;
pub mod install;
pub mod manifest;

pub use install::{InstallDirs, InstallEntry, InstallManifest, ManifestError};
pub use manifest::{Manifest, ModuleConfig, MANIFEST_NAME};
