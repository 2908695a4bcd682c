//! Extra files installed alongside the module.
//!
//! Entries are plain data: nothing is checked when an entry is added.
//! Missing source files are reported when the build descriptor is
//! generated.

use std::collections::BTreeMap;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substitution depth after which a template reference is left unexpanded.
const MAX_EXPANSION_DEPTH: usize = 16;

/// One file to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallEntry {
    /// File to copy, relative to the source directory
    pub source: PathBuf,
    /// Destination directory; may reference install directories as `$(name)`
    pub target: String,
    /// Install group; entries of a group install under `install-<group>`
    pub group: String,
}

/// Ordered list of install entries, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallManifest {
    entries: Vec<InstallEntry>,
}

impl InstallManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add(
        &mut self,
        source: impl Into<PathBuf>,
        target: impl Into<String>,
        group: impl Into<String>,
    ) -> &mut Self {
        self.entries.push(InstallEntry {
            source: source.into(),
            target: target.into(),
            group: group.into(),
        });
        self
    }

    pub fn entries(&self) -> &[InstallEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<InstallEntry> for InstallManifest {
    fn from_iter<I: IntoIterator<Item = InstallEntry>>(iter: I) -> Self {
        InstallManifest {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Install directory variables, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDirs {
    vars: Vec<(String, String)>,
}

impl Default for InstallDirs {
    fn default() -> Self {
        let vars = [
            ("prefix", "/usr/local".to_string()),
            ("exec_prefix", "$(prefix)".to_string()),
            ("libdir", "$(exec_prefix)/lib".to_string()),
            ("includedir", "$(prefix)/include".to_string()),
            ("archdir", format!("$(libdir)/{}", host_arch_dir())),
        ];
        InstallDirs {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Architecture directory name for the host, e.g. `x86_64-linux`.
pub fn host_arch_dir() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

impl InstallDirs {
    /// Set a variable, replacing its value in place or appending it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name, value)),
        }
    }

    /// Apply configured overrides.
    pub fn apply(&mut self, overrides: &BTreeMap<String, String>) {
        for (name, value) in overrides {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand `$(name)` and `${name}` references recursively.
    ///
    /// Unknown variables are left in place for make to expand.
    pub fn resolve(&self, template: &str) -> String {
        self.expand(template, 0)
    }

    fn expand(&self, template: &str, depth: usize) -> String {
        if depth >= MAX_EXPANSION_DEPTH {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            let close = match tail.as_bytes().get(1) {
                Some(b'(') => Some(')'),
                Some(b'{') => Some('}'),
                _ => None,
            };

            // (name, bytes consumed including `$(` and `)`)
            let reference = close.and_then(|c| {
                tail[2..]
                    .find(c)
                    .map(|end| (&tail[2..2 + end], 3 + end))
            });

            match reference {
                Some((name, consumed)) => {
                    match self.get(name) {
                        Some(value) => out.push_str(&self.expand(value, depth + 1)),
                        None => out.push_str(&tail[..consumed]),
                    }
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('$');
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Fatal problems with the install manifest or module name.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("install source `{}` not found in {}", .source_file.display(), .search_dir.display())]
    #[diagnostic(
        code(extconf::manifest::missing_source),
        help("check the `source` of the [[install]] entry or pass --srcdir")
    )]
    MissingSource {
        source_file: PathBuf,
        search_dir: PathBuf,
        group: String,
    },

    #[error("`{}` and `{}` both install to {dest}", .first.display(), .second.display())]
    #[diagnostic(
        code(extconf::manifest::duplicate_destination),
        help("give one of the [[install]] entries a different target")
    )]
    DuplicateDestination {
        dest: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid module name `{name}`: {reason}")]
    #[diagnostic(code(extconf::manifest::module_name))]
    InvalidModuleName { name: String, reason: String },
}
