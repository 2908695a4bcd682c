//! Built-in configuration for the UTF-8 character encoding module.
//!
//! Used when no `extconf.toml` is present in the source directory.

/// Module built by default.
pub const MODULE_NAME: &str = "encoding/character/utf-8/utf8";

/// Candidate flags, probed in this order.
///
/// Not probed: `-Wconversion`, `-Wunreachable-code` (false positives),
/// `-Wlarger-than-65500` (the decomposition tables exceed it),
/// `-Wredundant-decls`, `-Wshadow` (noise from host headers).
pub const CANDIDATE_FLAGS: &[&str] = &[
    "-std=c99",
    "-finline-functions",
    "-fno-common",
    "-Wall",
    "-Waggregate-return",
    "-Wcast-align",
    "-Wextra",
    "-Wformat=2",
    "-Winit-self",
    "-Winline",
    "-Wmissing-declarations",
    "-Wmissing-format-attribute",
    "-Wmissing-include-dirs",
    "-Wmissing-noreturn",
    "-Wmissing-prototypes",
    "-Wnested-externs",
    "-Wold-style-definition",
    "-Wpacked",
    "-Wp,-D_FORTIFY_SOURCE=2",
    "-Wpointer-arith",
    "-Wsign-compare",
    "-Wstrict-aliasing=2",
    "-Wswitch-default",
    "-Wswitch-enum",
    "-Wundef",
    "-Wunsafe-loop-optimizations",
    "-Wwrite-strings",
];

/// Standard headers the module can use when present.
pub const CANDIDATE_HEADERS: &[&str] = &[
    "assert.h",
    "limits.h",
    "locale.h",
    "stdbool.h",
    "stddef.h",
    "stdint.h",
    "stdio.h",
    "stdlib.h",
    "string.h",
    "sys/types.h",
    "wchar.h",
];

/// Public header installed next to the module: (source, target, group).
pub const INSTALL_FILES: &[(&str, &str, &str)] = &[("unicode.h", "$(moduledir)", "lib")];

/// Source globs compiled into the module.
pub const SOURCES: &[&str] = &["*.c"];
