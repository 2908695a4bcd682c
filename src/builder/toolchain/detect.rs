//! Toolchain detection functions.

use std::path::{Path, PathBuf};

use crate::util::config::{env_flags, ToolchainConfig};

use super::{GccToolchain, Toolchain, ToolchainPlatform, ToolchainUnavailable};

/// Detect the available toolchain.
///
/// Tries to find a C compiler with the following priority:
/// 1. `cc` from the toolchain config
/// 2. The `CC` environment variable (may carry leading arguments, e.g. `ccache gcc`)
/// 3. cc, gcc, or clang on PATH
///
/// An explicitly requested compiler that cannot be found is fatal; no
/// fallback to another compiler is attempted.
pub fn detect_toolchain(config: &ToolchainConfig) -> Result<Box<dyn Toolchain>, ToolchainUnavailable> {
    let (cc, cc_args) = if let Some(ref cc) = config.toolchain.cc {
        (resolve_program(cc)?, Vec::new())
    } else if let Some((program, args)) = cc_from_env() {
        (resolve_program(Path::new(&program))?, args)
    } else {
        let cc = crate::util::process::find_c_compiler().ok_or_else(|| {
            ToolchainUnavailable::new(None, "no C compiler (cc, gcc, clang) found in PATH")
        })?;
        (cc, Vec::new())
    };

    let family = detect_compiler_family(&cc);

    let cflags = if config.toolchain.cflags.is_empty() {
        env_flags("CFLAGS")
    } else {
        config.toolchain.cflags.clone()
    };
    let ldflags = if config.toolchain.ldflags.is_empty() {
        env_flags("LDFLAGS")
    } else {
        config.toolchain.ldflags.clone()
    };

    tracing::debug!(
        "selected C compiler {} ({})",
        cc.display(),
        family.as_str()
    );

    Ok(Box::new(
        GccToolchain::new(cc, family)
            .with_cc_args(cc_args)
            .with_cflags(&cflags)
            .with_ldflags(ldflags),
    ))
}

/// Split `CC` into program and leading arguments.
fn cc_from_env() -> Option<(String, Vec<String>)> {
    let value = std::env::var("CC").ok()?;
    let mut words = value.split_whitespace().map(str::to_string);
    let program = words.next()?;
    Some((program, words.collect()))
}

/// Resolve a compiler name or path to an existing executable.
fn resolve_program(program: &Path) -> Result<PathBuf, ToolchainUnavailable> {
    which::which(program).map_err(|e| {
        ToolchainUnavailable::new(
            Some(program.to_path_buf()),
            format!("`{}` is not an executable: {}", program.display(), e),
        )
    })
}

/// Detect whether the compiler is GCC, Clang, or Apple Clang.
fn detect_compiler_family(cc: &Path) -> ToolchainPlatform {
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("clang") {
        return detect_clang_variant(cc);
    } else if name.contains("gcc") {
        return ToolchainPlatform::Gcc;
    }

    // `cc` is usually a symlink; ask the compiler itself
    let output = std::process::Command::new(cc).arg("--version").output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("clang") {
            return detect_clang_variant(cc);
        }
    }

    ToolchainPlatform::Gcc
}

/// Detect if Clang is Apple Clang or regular Clang.
fn detect_clang_variant(cc: &Path) -> ToolchainPlatform {
    let output = std::process::Command::new(cc).arg("--version").output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("apple") {
            return ToolchainPlatform::AppleClang;
        }
    }

    ToolchainPlatform::Clang
}
