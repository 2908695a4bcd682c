//! Implementation of `extconf generate` and `extconf probe`.
//!
//! A run loads the project configuration, selects the C compiler, probes
//! flags and then headers, and finally writes the Makefile. Any fatal
//! error aborts the run before the Makefile is touched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::descriptor::{BuildDescriptor, DescriptorGenerator};
use crate::builder::toolchain::{detect_toolchain, Toolchain};
use crate::builder::trial::{ToolchainCompiler, TrialCompiler};
use crate::core::manifest::Manifest;
use crate::ops::errors::ConfigureError;
use crate::probe::{FlagProber, FlagSet, HeaderProber, HeaderResult};
use crate::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
};
use crate::util::fs::{glob_files, write_string};
use crate::util::shell::{Shell, Status};

/// Default name of the generated descriptor.
pub const DEFAULT_OUTPUT: &str = "Makefile";

/// Options for the generate command.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Directory holding the module sources and `extconf.toml`
    pub srcdir: PathBuf,

    /// Explicit manifest path (overrides `<srcdir>/extconf.toml`)
    pub config: Option<PathBuf>,

    /// Module name (overrides the manifest)
    pub module: Option<String>,

    /// Where to write the Makefile
    pub output: PathBuf,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        ConfigureOptions {
            srcdir: PathBuf::from("."),
            config: None,
            module: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Options for the probe command.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub srcdir: PathBuf,
    pub config: Option<PathBuf>,
}

/// What the probes found.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Accepted flags in probing order
    pub flags: FlagSet,
    /// One result per candidate header
    pub headers: Vec<HeaderResult>,
}

/// Result of a successful configure run.
#[derive(Debug)]
pub struct ConfigureResult {
    pub makefile: PathBuf,
    pub report: ProbeReport,
    pub descriptor: BuildDescriptor,
}

/// Load the manifest named by `config`, or discover one in `srcdir`.
pub fn load_manifest(srcdir: &Path, config: Option<&Path>) -> Result<Manifest, ConfigureError> {
    let result = match config {
        Some(path) => Manifest::load(path),
        None => Manifest::discover(srcdir),
    };

    result.map_err(|e| ConfigureError::Config {
        path: config
            .map(Path::to_path_buf)
            .unwrap_or_else(|| srcdir.join(crate::core::manifest::MANIFEST_NAME)),
        message: format!("{:#}", e),
    })
}

/// Select the C compiler for `srcdir`, honoring toolchain overrides.
pub fn load_toolchain(srcdir: &Path) -> Result<Box<dyn Toolchain>, ConfigureError> {
    let config = load_toolchain_config(
        global_toolchain_config_path().as_deref(),
        &project_toolchain_config_path(srcdir),
    );
    Ok(detect_toolchain(&config)?)
}

/// Probe every candidate flag, then every candidate header.
pub fn run_probes<C: TrialCompiler + ?Sized>(
    compiler: &C,
    manifest: &Manifest,
    shell: &Shell,
) -> Result<ProbeReport, ConfigureError> {
    let flags = FlagProber::new(compiler, shell).probe_all(&manifest.flags)?;
    tracing::debug!("accepted flags: {:?}", flags.as_slice());

    let headers = HeaderProber::new(compiler, shell, &flags).check_all(&manifest.headers)?;

    Ok(ProbeReport { flags, headers })
}

/// Run the probes and write the Makefile.
pub fn configure(opts: &ConfigureOptions, shell: &Shell) -> Result<ConfigureResult> {
    let manifest = load_manifest(&opts.srcdir, opts.config.as_deref())?;
    let toolchain = load_toolchain(&opts.srcdir)?;
    let compiler = ToolchainCompiler::new(toolchain.as_ref());

    configure_with(opts, &manifest, toolchain.as_ref(), &compiler, shell)
}

/// [`configure`] with the manifest, toolchain, and trial compiler supplied.
pub fn configure_with<C: TrialCompiler + ?Sized>(
    opts: &ConfigureOptions,
    manifest: &Manifest,
    toolchain: &dyn Toolchain,
    compiler: &C,
    shell: &Shell,
) -> Result<ConfigureResult> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let srcdir = cwd.join(&opts.srcdir);
    let output = cwd.join(&opts.output);
    let makefile_dir = output.parent().unwrap_or(cwd.as_path()).to_path_buf();

    shell.status(
        Status::Using,
        format_args!(
            "{} ({})",
            toolchain.compiler_command_line(),
            toolchain.platform().as_str()
        ),
    );

    let report = run_probes(compiler, manifest, shell)?;

    let sources = glob_files(&srcdir, &manifest.module.sources)?;
    if sources.is_empty() {
        shell.warn(format_args!(
            "no C sources match {} in {}",
            manifest.module.sources.join(", "),
            srcdir.display()
        ));
    }

    let module = opts.module.as_deref().unwrap_or(&manifest.module.name);
    let descriptor = DescriptorGenerator::new(toolchain, &srcdir)
        .with_makefile_dir(&makefile_dir)
        .with_install_dirs(manifest.install_dirs())
        .with_sources(sources)
        .generate(module, &report.flags, &report.headers, &manifest.install)
        .map_err(ConfigureError::from)?;

    write_string(&output, &descriptor.to_makefile())?;

    shell.status(
        Status::Generated,
        format_args!("{} for {}", opts.output.display(), descriptor.module.as_str()),
    );
    shell.status(
        Status::Finished,
        format_args!(
            "{} flags accepted, {} of {} headers found",
            report.flags.len(),
            report.headers.iter().filter(|h| h.is_present()).count(),
            report.headers.len()
        ),
    );

    Ok(ConfigureResult {
        makefile: output,
        report,
        descriptor,
    })
}

/// Run the probes only and report what they found.
pub fn probe(opts: &ProbeOptions, shell: &Shell) -> Result<ProbeReport> {
    let manifest = load_manifest(&opts.srcdir, opts.config.as_deref())?;
    let toolchain = load_toolchain(&opts.srcdir)?;
    let compiler = ToolchainCompiler::new(toolchain.as_ref());

    let report = run_probes(&compiler, &manifest, shell)?;
    report_probes(&report, shell)?;
    Ok(report)
}

/// Emit the summary of a probe run: one JSON event, or a status line.
pub fn report_probes(report: &ProbeReport, shell: &Shell) -> Result<()> {
    if shell.is_json() {
        let mut event = serde_json::to_value(report).context("failed to serialize probe report")?;
        if let Some(map) = event.as_object_mut() {
            map.insert("reason".to_string(), "probe-finished".into());
        }
        shell.json_event(&event);
    } else {
        shell.status(
            Status::Finished,
            format_args!(
                "CFLAGS += {}",
                report.flags.iter().collect::<Vec<_>>().join(" ")
            ),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{GccToolchain, ToolchainPlatform};
    use crate::core::install::ManifestError;
    use crate::probe::CandidateFlag;
    use crate::test_support::MockCompiler;
    use tempfile::TempDir;

    fn gcc() -> GccToolchain {
        GccToolchain::new(PathBuf::from("gcc"), ToolchainPlatform::Gcc)
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("utf8.c"), "int x;\n").unwrap();
        std::fs::write(tmp.path().join("unicode.h"), "").unwrap();
        tmp
    }

    fn options(tmp: &TempDir) -> ConfigureOptions {
        ConfigureOptions {
            srcdir: tmp.path().to_path_buf(),
            output: tmp.path().join("Makefile"),
            ..ConfigureOptions::default()
        }
    }

    fn manifest(flags: &[&str]) -> Manifest {
        let mut manifest = Manifest::builtin();
        manifest.flags = flags.iter().copied().map(CandidateFlag::from).collect();
        manifest.headers = vec!["stdint.h".to_string(), "no-such-header.h".to_string()];
        manifest
    }

    #[test]
    fn test_configure_writes_makefile() {
        let tmp = project();
        let compiler = MockCompiler::new()
            .accept_flags(["-std=c99", "-Wall"])
            .provide_headers(["stdint.h"]);

        let result = configure_with(
            &options(&tmp),
            &manifest(&["-std=c99", "-bogus-flag-xyz", "-Wall"]),
            &gcc(),
            &compiler,
            &Shell::quiet(),
        )
        .unwrap();

        assert_eq!(result.report.flags.as_slice(), ["-std=c99", "-Wall"]);

        let makefile = std::fs::read_to_string(tmp.path().join("Makefile")).unwrap();
        assert!(makefile.contains("\nCFLAGS = -fPIC -O2 -std=c99 -Wall\n"));
        assert!(makefile.contains("\nDEFS = -DHAVE_STDINT_H\n"));
        assert!(!makefile.contains("-bogus-flag-xyz"));
        assert!(makefile.contains("\nsrcdir = .\n"));
        assert!(makefile.contains("\nSRCS = utf8.c\n"));
        assert!(makefile.contains("unicode.h"));
    }

    #[test]
    fn test_module_override() {
        let tmp = project();
        let mut opts = options(&tmp);
        opts.module = Some("ext/demo".to_string());

        let result = configure_with(
            &opts,
            &manifest(&[]),
            &gcc(),
            &MockCompiler::new(),
            &Shell::quiet(),
        )
        .unwrap();

        assert_eq!(result.descriptor.module.target(), "demo");
    }

    #[test]
    fn test_missing_install_source_writes_nothing() {
        let tmp = project();
        std::fs::remove_file(tmp.path().join("unicode.h")).unwrap();

        let err = configure_with(
            &options(&tmp),
            &manifest(&["-std=c99"]),
            &gcc(),
            &MockCompiler::new().accept_flags(["-std=c99"]),
            &Shell::quiet(),
        )
        .unwrap_err();

        let err = err.downcast_ref::<ConfigureError>().unwrap();
        assert!(matches!(
            err,
            ConfigureError::Manifest(ManifestError::MissingSource { .. })
        ));
        assert!(!tmp.path().join("Makefile").exists());
    }

    #[test]
    fn test_unavailable_compiler_writes_nothing() {
        let tmp = project();

        let err = configure_with(
            &options(&tmp),
            &manifest(&["-std=c99"]),
            &gcc(),
            &MockCompiler::unavailable(),
            &Shell::quiet(),
        )
        .unwrap_err();

        let err = err.downcast_ref::<ConfigureError>().unwrap();
        assert_eq!(err.stage(), "toolchain");
        assert!(!tmp.path().join("Makefile").exists());
    }

    #[test]
    fn test_probes_run_flags_before_headers() {
        let compiler = MockCompiler::new()
            .accept_flags(["-std=c99"])
            .provide_headers(["stdint.h"]);

        let report = run_probes(&compiler, &manifest(&["-std=c99"]), &Shell::quiet()).unwrap();

        let calls = compiler.invocations();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].flags, vec!["-std=c99"]);
        assert!(calls[1].source.contains("stdint.h"));
        assert_eq!(calls[1].flags, vec!["-std=c99"]);
        assert_eq!(
            report.headers,
            vec![
                HeaderResult::new("stdint.h", true),
                HeaderResult::new("no-such-header.h", false),
            ]
        );
    }

    #[test]
    fn test_bad_manifest_is_config_error() {
        let tmp = project();
        let path = tmp.path().join("extconf.toml");
        std::fs::write(&path, "[module\n").unwrap();

        let err = load_manifest(tmp.path(), None).unwrap_err();
        assert_eq!(err.stage(), "config");
        match err {
            ConfigureError::Config { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
