//! Build descriptor generation.
//!
//! The generator combines the probe results with the install manifest and
//! the toolchain defaults into a [`BuildDescriptor`], which renders as a
//! Makefile. Generation fails if any declared install source is missing.

use std::path::{Path, PathBuf};

use crate::builder::toolchain::Toolchain;
use crate::core::install::{InstallDirs, InstallManifest, ManifestError};
use crate::probe::{FlagSet, HeaderResult};
use crate::util::fs::relative_path;

use super::makefile::Makefile;

/// A validated module path such as `encoding/character/utf-8/utf8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleName {
    full: String,
}

impl ModuleName {
    /// Validate a module path.
    ///
    /// The name must be relative, non-empty, and made only of normal
    /// segments (no empty, `.` or `..` segments).
    pub fn parse(name: &str) -> Result<Self, ManifestError> {
        let invalid = |reason: &str| ManifestError::InvalidModuleName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("module name is empty"));
        }
        if name.starts_with('/') || Path::new(name).is_absolute() {
            return Err(invalid("module name must be a relative path"));
        }
        for segment in name.split('/') {
            match segment {
                "" => return Err(invalid("module name has an empty path segment")),
                "." | ".." => return Err(invalid("module name may not contain `.` or `..`")),
                _ => {}
            }
        }

        Ok(ModuleName {
            full: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The last segment, which names the module binary.
    pub fn target(&self) -> &str {
        match self.full.rsplit_once('/') {
            Some((_, target)) => target,
            None => &self.full,
        }
    }

    /// Everything before the last segment, if anything.
    pub fn prefix(&self) -> Option<&str> {
        self.full.rsplit_once('/').map(|(prefix, _)| prefix)
    }

    /// Install directory of the module binary, as a make reference.
    pub fn install_dir(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("$(archdir)/{}", prefix),
            None => "$(archdir)".to_string(),
        }
    }
}

/// One install rule, with its destination resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRule {
    /// Source file, relative to the source directory
    pub source: PathBuf,
    /// Destination directory after template expansion
    pub dest_dir: String,
    pub group: String,
}

impl InstallRule {
    /// Full destination path of the installed file.
    pub fn dest_file(&self) -> String {
        let file_name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", self.dest_dir.trim_end_matches('/'), file_name)
    }
}

/// Everything needed to write the Makefile of one module.
#[derive(Debug, Clone)]
pub struct BuildDescriptor {
    pub module: ModuleName,
    /// Compiler command line (`CC`)
    pub compiler: String,
    /// Toolchain defaults that open the `CFLAGS` directive
    pub default_cflags: Vec<String>,
    /// Accepted probe flags, in probing order
    pub flags: FlagSet,
    pub headers: Vec<HeaderResult>,
    /// Install rules in declaration order
    pub install: Vec<InstallRule>,
    /// Install directory variables, `moduledir` included
    pub install_dirs: InstallDirs,
    /// Source directory as written into the Makefile
    pub srcdir: String,
    /// C sources relative to the source directory
    pub sources: Vec<PathBuf>,
    pub ldshared: String,
    pub ldflags: Vec<String>,
    pub object_extension: String,
    pub module_extension: String,
}

impl BuildDescriptor {
    /// The combined flags directive: defaults first, then accepted flags.
    pub fn cflags(&self) -> Vec<&str> {
        self.default_cflags
            .iter()
            .map(String::as_str)
            .chain(self.flags.iter())
            .collect()
    }

    /// `-DHAVE_*` defines for every present header, in checking order.
    pub fn defines(&self) -> Vec<String> {
        self.headers
            .iter()
            .filter_map(HeaderResult::capability)
            .map(|name| format!("-D{}", name))
            .collect()
    }

    /// Install groups in first-declaration order.
    pub fn install_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for rule in &self.install {
            if !groups.contains(&rule.group.as_str()) {
                groups.push(&rule.group);
            }
        }
        groups
    }

    /// Object files, one per source.
    pub fn objects(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .map(|s| s.with_extension(&self.object_extension))
            .collect()
    }

    /// Render the Makefile text.
    pub fn to_makefile(&self) -> String {
        Makefile::new(self).to_string()
    }
}

/// Produces build descriptors for one source directory.
pub struct DescriptorGenerator<'a> {
    toolchain: &'a dyn Toolchain,
    srcdir: PathBuf,
    makefile_dir: Option<PathBuf>,
    install_dirs: InstallDirs,
    sources: Vec<PathBuf>,
}

impl<'a> DescriptorGenerator<'a> {
    pub fn new(toolchain: &'a dyn Toolchain, srcdir: impl Into<PathBuf>) -> Self {
        DescriptorGenerator {
            toolchain,
            srcdir: srcdir.into(),
            makefile_dir: None,
            install_dirs: InstallDirs::default(),
            sources: Vec::new(),
        }
    }

    pub fn with_install_dirs(mut self, dirs: InstallDirs) -> Self {
        self.install_dirs = dirs;
        self
    }

    /// C sources to build; absolute paths are made relative to the source
    /// directory.
    pub fn with_sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self
    }

    /// Directory the Makefile will be written to. `srcdir` is then written
    /// relative to it.
    pub fn with_makefile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.makefile_dir = Some(dir.into());
        self
    }

    /// Generate the descriptor for `module_name`.
    pub fn generate(
        &self,
        module_name: &str,
        flags: &FlagSet,
        headers: &[HeaderResult],
        install: &InstallManifest,
    ) -> Result<BuildDescriptor, ManifestError> {
        let module = ModuleName::parse(module_name)?;

        let mut install_dirs = self.install_dirs.clone();
        if install_dirs.get("moduledir").is_none() {
            install_dirs.set("moduledir", module.install_dir());
        }

        let mut rules: Vec<InstallRule> = Vec::with_capacity(install.len());
        for entry in install.entries() {
            if !self.srcdir.join(&entry.source).is_file() {
                return Err(ManifestError::MissingSource {
                    source_file: entry.source.clone(),
                    search_dir: self.srcdir.clone(),
                    group: entry.group.clone(),
                });
            }
            let rule = InstallRule {
                source: self.srcdir_relative(&entry.source),
                dest_dir: install_dirs.resolve(&entry.target),
                group: entry.group.clone(),
            };

            // Each destination file gets exactly one make target
            let dest = rule.dest_file();
            if let Some(first) = rules.iter().find(|r| r.dest_file() == dest) {
                return Err(ManifestError::DuplicateDestination {
                    dest,
                    first: first.source.clone(),
                    second: rule.source,
                });
            }
            rules.push(rule);
        }

        let sources = self
            .sources
            .iter()
            .map(|s| self.srcdir_relative(s))
            .collect();

        tracing::debug!(
            "descriptor for {}: {} flags, {} install rules",
            module.as_str(),
            flags.len(),
            rules.len()
        );

        Ok(BuildDescriptor {
            module,
            compiler: self.toolchain.compiler_command_line(),
            default_cflags: self.toolchain.default_cflags().to_vec(),
            flags: flags.clone(),
            headers: headers.to_vec(),
            install: rules,
            install_dirs,
            srcdir: self.makefile_srcdir(),
            sources,
            ldshared: self.toolchain.ldshared(),
            ldflags: self.toolchain.ldflags().to_vec(),
            object_extension: self.toolchain.object_extension().to_string(),
            module_extension: self.toolchain.module_extension().to_string(),
        })
    }

    /// Absolute paths become relative to the source directory.
    fn srcdir_relative(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            relative_path(&self.srcdir, path)
        } else {
            path.to_path_buf()
        }
    }

    fn makefile_srcdir(&self) -> String {
        let srcdir = match &self.makefile_dir {
            Some(dir) => relative_path(dir, &self.srcdir),
            None => self.srcdir.clone(),
        };
        if srcdir.as_os_str().is_empty() {
            ".".to_string()
        } else {
            srcdir.display().to_string()
        }
    }
}
