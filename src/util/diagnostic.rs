//! User-friendly diagnostic messages.
//!
//! Every fatal error names the stage that failed, the offending item, and
//! where possible a suggested fix.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    pub const NO_COMPILER: &str =
        "help: Set the CC environment variable or add `cc = \"...\"` to .extconf/toolchain.toml";

    pub const MISSING_INSTALL_SOURCE: &str =
        "help: Check the `source` of the [[install]] entry or pass --srcdir";

    pub const BAD_CONFIG: &str = "help: Fix the syntax error in extconf.toml and run again";

    pub const DUPLICATE_INSTALL_DESTINATION: &str =
        "help: Give one of the [[install]] entries a different `target`";
}

/// An error message with optional context and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let label = if color {
            "\x1b[1;31merror\x1b[0m"
        } else {
            "error"
        };
        output.push_str(&format!("{}: {}\n", label, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                output.push_str(&format!("{}\n", suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("[manifest] install source `unicode.h` not found")
            .with_location("/src/ext")
            .with_context("declared for $(archdir) in group `lib`")
            .with_suggestion(suggestions::MISSING_INSTALL_SOURCE);

        let output = diag.format(false);
        assert!(output.starts_with("error: [manifest] install source"));
        assert!(output.contains("  --> /src/ext"));
        assert!(output.contains("  = declared for $(archdir)"));
        assert!(output.contains("help: Check the `source`"));
    }

    #[test]
    fn test_color_only_when_enabled() {
        let diag = Diagnostic::error("C compiler unavailable");
        assert_eq!(diag.format(false), "error: C compiler unavailable\n");
        assert!(diag.format(true).starts_with("\x1b[1;31merror\x1b[0m: "));
    }
}
