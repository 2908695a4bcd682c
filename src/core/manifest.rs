//! extconf.toml parsing and schema.
//!
//! ```toml
//! headers = ["stdint.h", "wchar.h"]
//!
//! [module]
//! name = "encoding/character/utf-8/utf8"
//! sources = ["*.c"]
//!
//! [[flag]]
//! flag = "-std=c99"
//!
//! [[flag]]
//! flag = "-fopenmp"
//! source = "#include <omp.h>\nint main(void) { return omp_get_max_threads(); }\n"
//!
//! [[install]]
//! source = "unicode.h"
//! target = "$(moduledir)"
//! group = "lib"
//!
//! [install_dirs]
//! prefix = "/opt/ext"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::defaults;
use crate::core::install::{InstallDirs, InstallEntry, InstallManifest};
use crate::probe::CandidateFlag;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "extconf.toml";

/// The [module] section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleConfig {
    /// Module path; the last segment names the binary
    pub name: String,

    /// Globs, relative to the source directory, of the C sources to build
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

fn default_sources() -> Vec<String> {
    defaults::SOURCES.iter().map(|s| s.to_string()).collect()
}

/// The parsed configuration of one module.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub module: ModuleConfig,

    /// Candidate flags in probing order
    pub flags: Vec<CandidateFlag>,

    /// Candidate headers in checking order
    pub headers: Vec<String>,

    /// Extra files to install
    pub install: InstallManifest,

    /// Install directory overrides
    pub install_dirs: BTreeMap<String, String>,

    /// The file this manifest was read from (None for the built-in one)
    pub path: Option<PathBuf>,
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    module: ModuleConfig,

    #[serde(default, rename = "flag")]
    flags: Vec<RawFlag>,

    #[serde(default)]
    headers: Vec<String>,

    #[serde(default)]
    install: Vec<InstallEntry>,

    #[serde(default)]
    install_dirs: BTreeMap<String, String>,
}

/// A flag may be given as a bare string or as a table with a trial source.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Simple(String),
    Detailed(CandidateFlag),
}

impl From<RawFlag> for CandidateFlag {
    fn from(raw: RawFlag) -> Self {
        match raw {
            RawFlag::Simple(flag) => CandidateFlag::new(flag),
            RawFlag::Detailed(candidate) => candidate,
        }
    }
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, Some(path))
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: Option<&Path>) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", MANIFEST_NAME))?;

        Ok(Manifest {
            module: raw.module,
            flags: raw.flags.into_iter().map(CandidateFlag::from).collect(),
            headers: raw.headers,
            install: raw.install.into_iter().collect(),
            install_dirs: raw.install_dirs,
            path: path.map(Path::to_path_buf),
        })
    }

    /// The built-in manifest for the UTF-8 encoding module.
    pub fn builtin() -> Self {
        let mut install = InstallManifest::new();
        for (source, target, group) in defaults::INSTALL_FILES {
            install.add(*source, *target, *group);
        }

        Manifest {
            module: ModuleConfig {
                name: defaults::MODULE_NAME.to_string(),
                sources: default_sources(),
            },
            flags: defaults::CANDIDATE_FLAGS
                .iter()
                .copied()
                .map(CandidateFlag::from)
                .collect(),
            headers: defaults::CANDIDATE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            install,
            install_dirs: BTreeMap::new(),
            path: None,
        }
    }

    /// Load `extconf.toml` from `dir`, or the built-in manifest if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!("no {} in {}, using built-in manifest", MANIFEST_NAME, dir.display());
            Ok(Self::builtin())
        }
    }

    /// Install directories with this manifest's overrides applied.
    pub fn install_dirs(&self) -> InstallDirs {
        let mut dirs = InstallDirs::default();
        dirs.apply(&self.install_dirs);
        dirs
    }
}
