//! Makefile rendering of a build descriptor.

use std::fmt;
use std::path::Path;

use super::descriptor::{BuildDescriptor, InstallRule};

/// Group whose install target installs the module binary itself.
pub const MODULE_INSTALL_GROUP: &str = "so";

/// Displays a [`BuildDescriptor`] as Makefile text.
pub struct Makefile<'a> {
    desc: &'a BuildDescriptor,
}

impl<'a> Makefile<'a> {
    pub fn new(desc: &'a BuildDescriptor) -> Self {
        Makefile { desc }
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.desc;
        writeln!(
            f,
            "# Makefile for {}, generated by extconf {}",
            desc.module.as_str(),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(f)?;
        writeln!(f, "SHELL = /bin/sh")?;
        writeln!(f)?;
        writeln!(f, "srcdir = {}", desc.srcdir)?;
        writeln!(f, "VPATH = $(srcdir)")?;
        writeln!(f)?;

        for (name, value) in desc.install_dirs.iter() {
            writeln!(f, "{} = {}", name, value)?;
        }
        writeln!(f)
    }

    fn write_toolchain(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.desc;
        writeln!(f, "CC = {}", desc.compiler)?;
        writeln!(f, "{}", directive("CFLAGS", desc.cflags()))?;
        writeln!(f, "{}", directive("DEFS", desc.defines()))?;
        writeln!(f, "CPPFLAGS = -I. -I$(srcdir) $(DEFS)")?;
        writeln!(f, "LDSHARED = {}", desc.ldshared)?;
        writeln!(f, "{}", directive("LDFLAGS", &desc.ldflags))?;
        writeln!(f, "LIBS =")?;
        writeln!(f)?;
        writeln!(f, "INSTALL = install -c")?;
        writeln!(f, "INSTALL_PROG = $(INSTALL) -m 0755")?;
        writeln!(f, "INSTALL_DATA = $(INSTALL) -m 0644")?;
        writeln!(f, "MAKEDIRS = mkdir -p")?;
        writeln!(f, "RM = rm -f")?;
        writeln!(f)
    }

    fn write_target(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.desc;
        writeln!(f, "TARGET = {}", desc.module.target())?;
        writeln!(f, "DLLIB = $(TARGET).{}", desc.module_extension)?;
        writeln!(f, "{}", directive("SRCS", paths(&desc.sources)))?;
        writeln!(f, "{}", directive("OBJS", paths(&desc.objects())))?;
        writeln!(f)?;
        writeln!(f, ".SUFFIXES: .c .{}", desc.object_extension)?;

        let mut phony = vec![
            "all".to_string(),
            "clean".to_string(),
            "distclean".to_string(),
            "install".to_string(),
        ];
        phony.extend(self.install_targets());
        writeln!(f, ".PHONY: {}", phony.join(" "))?;
        writeln!(f)
    }

    fn write_build_rules(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let obj = &self.desc.object_extension;

        writeln!(f, "all: $(DLLIB)")?;
        writeln!(f)?;
        writeln!(f, "$(DLLIB): $(OBJS)")?;
        writeln!(f, "\t$(RM) $@")?;
        writeln!(f, "\t$(LDSHARED) -o $@ $(OBJS) $(LDFLAGS) $(LIBS)")?;
        writeln!(f)?;
        writeln!(f, ".c.{}:", obj)?;
        writeln!(f, "\t$(CC) $(CPPFLAGS) $(CFLAGS) -c $< -o $@")?;
        writeln!(f)?;
        writeln!(f, "clean:")?;
        writeln!(f, "\t$(RM) $(DLLIB) $(OBJS)")?;
        writeln!(f)?;
        writeln!(f, "distclean: clean")?;
        writeln!(f, "\t$(RM) Makefile")?;
        writeln!(f)
    }

    fn write_install_rules(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "install: {}", self.install_targets().join(" "))?;
        writeln!(f)?;

        writeln!(
            f,
            "install-{}: $(DESTDIR)$(moduledir)/$(DLLIB)",
            MODULE_INSTALL_GROUP
        )?;
        writeln!(f, "$(DESTDIR)$(moduledir)/$(DLLIB): $(DLLIB)")?;
        writeln!(f, "\t$(MAKEDIRS) $(@D)")?;
        writeln!(f, "\t$(INSTALL_PROG) $(DLLIB) $(@D)")?;

        // One rule per entry, in declaration order
        for rule in &self.desc.install {
            writeln!(f)?;
            write_install_rule(f, rule)?;
        }
        Ok(())
    }

    /// `install-so` followed by the manifest groups in first-declaration order.
    fn install_targets(&self) -> Vec<String> {
        let mut targets = vec![format!("install-{}", MODULE_INSTALL_GROUP)];
        for group in self.desc.install_groups() {
            let target = format!("install-{}", group);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

fn write_install_rule(f: &mut fmt::Formatter<'_>, rule: &InstallRule) -> fmt::Result {
    let dest = format!("$(DESTDIR){}", rule.dest_file());
    let source = if rule.source.is_absolute() {
        rule.source.display().to_string()
    } else {
        format!("$(srcdir)/{}", rule.source.display())
    };

    writeln!(f, "install-{}: {}", rule.group, dest)?;
    writeln!(f, "{}: {}", dest, source)?;
    writeln!(f, "\t$(MAKEDIRS) $(@D)")?;
    writeln!(f, "\t$(INSTALL_DATA) {} $(@D)", source)
}

impl fmt::Display for Makefile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_toolchain(f)?;
        self.write_target(f)?;
        self.write_build_rules(f)?;
        self.write_install_rules(f)
    }
}

/// `NAME = v1 v2 ...`, or `NAME =` when empty. Values are written literally.
fn directive<I, S>(name: &str, values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = format!("{} =", name);
    for value in values {
        line.push(' ');
        line.push_str(&escape_value(value.as_ref()));
    }
    line
}

/// Escape `$` and `#` so make neither expands nor truncates the value.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => out.push_str("$$"),
            '#' => out.push_str("\\#"),
            _ => out.push(c),
        }
    }
    out
}

fn paths<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::builder::descriptor::DescriptorGenerator;
    use crate::builder::toolchain::{GccToolchain, ToolchainPlatform};
    use crate::core::install::{InstallDirs, InstallManifest};
    use crate::probe::{FlagSet, HeaderResult};
    use tempfile::TempDir;

    fn line<'a>(makefile: &'a str, prefix: &str) -> &'a str {
        makefile
            .lines()
            .find(|l| l.starts_with(prefix))
            .unwrap_or_else(|| panic!("no line starting with {:?} in:\n{}", prefix, makefile))
    }

    fn render(flags: &FlagSet, headers: &[HeaderResult], install: &InstallManifest) -> String {
        let tc = GccToolchain::new(PathBuf::from("gcc"), ToolchainPlatform::Gcc);
        let tmp = TempDir::new().unwrap();
        for entry in install.entries() {
            std::fs::write(tmp.path().join(&entry.source), "").unwrap();
        }
        std::fs::write(tmp.path().join("utf8.c"), "").unwrap();

        let mut dirs = InstallDirs::default();
        dirs.set("archdir", "$(libdir)/x86_64-linux");

        DescriptorGenerator::new(&tc, tmp.path())
            .with_makefile_dir(tmp.path())
            .with_install_dirs(dirs)
            .with_sources(vec![tmp.path().join("utf8.c")])
            .generate("encoding/character/utf-8/utf8", flags, headers, install)
            .unwrap()
            .to_makefile()
    }

    #[test]
    fn test_flags_directive_excludes_rejected() {
        let flags = FlagSet::new().with("-std=c99");
        let makefile = render(&flags, &[], &InstallManifest::new());

        let cflags = line(&makefile, "CFLAGS =");
        assert_eq!(cflags, "CFLAGS = -fPIC -O2 -std=c99");
        assert!(!cflags.split_whitespace().any(|t| t == "-bogus-flag-xyz"));
    }

    #[test]
    fn test_empty_flags_and_headers() {
        let makefile = render(&FlagSet::new(), &[], &InstallManifest::new());
        assert_eq!(line(&makefile, "CFLAGS ="), "CFLAGS = -fPIC -O2");
        assert_eq!(line(&makefile, "DEFS ="), "DEFS =");
        assert_eq!(line(&makefile, "install:"), "install: install-so");
    }

    #[test]
    fn test_header_defines() {
        let headers = vec![
            HeaderResult::new("stdint.h", true),
            HeaderResult::new("no-such-header.h", false),
        ];
        let makefile = render(&FlagSet::new(), &headers, &InstallManifest::new());

        assert_eq!(line(&makefile, "DEFS ="), "DEFS = -DHAVE_STDINT_H");
        assert!(!makefile.contains("HAVE_NO_SUCH_HEADER_H"));
    }

    #[test]
    fn test_module_target_and_install_dir() {
        let makefile = render(&FlagSet::new(), &[], &InstallManifest::new());

        assert_eq!(line(&makefile, "TARGET ="), "TARGET = utf8");
        assert_eq!(line(&makefile, "DLLIB ="), "DLLIB = $(TARGET).so");
        assert_eq!(
            line(&makefile, "moduledir ="),
            "moduledir = $(archdir)/encoding/character/utf-8"
        );
        assert_eq!(line(&makefile, "SRCS ="), "SRCS = utf8.c");
        assert_eq!(line(&makefile, "OBJS ="), "OBJS = utf8.o");
        assert!(makefile.contains("\n$(DLLIB): $(OBJS)\n"));
        assert!(makefile.contains("\nclean:\n"));
    }

    #[test]
    fn test_install_rules_keep_declaration_order() {
        let mut install = InstallManifest::new();
        install
            .add("unicode.h", "$(moduledir)", "lib")
            .add("b.h", "$(includedir)", "headers")
            .add("a.h", "$(moduledir)", "lib");

        let makefile = render(&FlagSet::new(), &[], &install);

        assert_eq!(
            line(&makefile, "install:"),
            "install: install-so install-lib install-headers"
        );

        let unicode = makefile.find("$(srcdir)/unicode.h").unwrap();
        let b = makefile.find("$(srcdir)/b.h").unwrap();
        let a = makefile.find("$(srcdir)/a.h").unwrap();
        assert!(unicode < b && b < a);

        assert!(makefile.contains(
            "install-lib: $(DESTDIR)/usr/local/lib/x86_64-linux/encoding/character/utf-8/unicode.h\n"
        ));
        assert!(makefile.contains("\t$(INSTALL_DATA) $(srcdir)/unicode.h $(@D)\n"));
    }

    #[test]
    fn test_absolute_install_source_has_no_double_slash() {
        let tc = GccToolchain::new(PathBuf::from("gcc"), ToolchainPlatform::Gcc);
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("unicode.h"), "").unwrap();
        let mut install = InstallManifest::new();
        install.add(tmp.path().join("unicode.h"), "$(moduledir)", "lib");

        let makefile = DescriptorGenerator::new(&tc, tmp.path())
            .with_makefile_dir(tmp.path())
            .generate("utf8", &FlagSet::new(), &[], &install)
            .unwrap()
            .to_makefile();

        assert!(makefile.contains("\t$(INSTALL_DATA) $(srcdir)/unicode.h $(@D)\n"));
        assert!(!makefile.contains("$(srcdir)//"));
    }

    #[test]
    fn test_absolute_rule_source_written_as_is() {
        let tc = GccToolchain::new(PathBuf::from("gcc"), ToolchainPlatform::Gcc);
        let tmp = TempDir::new().unwrap();
        let mut desc = DescriptorGenerator::new(&tc, tmp.path())
            .generate("utf8", &FlagSet::new(), &[], &InstallManifest::new())
            .unwrap();
        desc.install.push(InstallRule {
            source: PathBuf::from("/usr/share/ext/unicode.h"),
            dest_dir: "/opt/ext".to_string(),
            group: "lib".to_string(),
        });

        let makefile = desc.to_makefile();
        assert!(makefile.contains("$(DESTDIR)/opt/ext/unicode.h: /usr/share/ext/unicode.h\n"));
        assert!(!makefile.contains("$(srcdir)//"));
    }

    #[test]
    fn test_flag_values_are_escaped() {
        let flags = FlagSet::new()
            .with("-DVERSION=$(VERSION)")
            .with("-DHASH=#");
        let makefile = render(&flags, &[], &InstallManifest::new());

        assert_eq!(
            line(&makefile, "CFLAGS ="),
            "CFLAGS = -fPIC -O2 -DVERSION=$$(VERSION) -DHASH=\\#"
        );
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("-Wall"), "-Wall");
        assert_eq!(escape_value("$ORIGIN"), "$$ORIGIN");
        assert_eq!(escape_value("a#b$"), "a\\#b$$");
    }

    #[test]
    fn test_recipes_use_tabs() {
        let makefile = render(&FlagSet::new(), &[], &InstallManifest::new());
        for l in makefile.lines() {
            assert!(!l.starts_with("    "), "space-indented recipe: {:?}", l);
        }
    }
}
