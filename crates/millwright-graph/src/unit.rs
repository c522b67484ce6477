use crate::GraphError;
use std::fs;
use std::path::{Path, PathBuf};

/// One packaging-unit definition: a line-oriented spec-like file declaring
/// required sibling units and source/patch inputs.
///
/// The text is scanned, never executed; `#`-prefixed trailing comments are
/// stripped before directive matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingUnit {
    pub name: String,
    pub spec_path: PathBuf,
    text: String,
}

/// A recognized directive line within a packaging unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Requires(String),
    Source { index: u32, value: String },
    Patch { index: u32, value: String },
}

impl PackagingUnit {
    pub fn new(name: impl Into<String>, spec_path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec_path: spec_path.into(),
            text: text.into(),
        }
    }

    /// Load a unit from disk; the unit name is the spec file stem.
    pub fn from_spec_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| GraphError::InvalidSpecPath(path.display().to_string()))?;
        let text = fs::read_to_string(path)?;
        Ok(Self::new(name, path, text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// All directive lines, in file order.
    pub fn directives(&self) -> Vec<Directive> {
        self.text
            .lines()
            .filter_map(|line| parse_directive(strip_comment(line)))
            .collect()
    }

    /// Names of sibling units this unit requires, in declaration order.
    pub fn requires(&self) -> Vec<String> {
        self.directives()
            .into_iter()
            .filter_map(|directive| match directive {
                Directive::Requires(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// The `Version:` declared in the unit text, unless it still contains
    /// placeholder tokens.
    pub fn declared_version(&self) -> Option<String> {
        self.scalar_directive("Version")
    }

    /// The `Release:` declared in the unit text, unless it still contains
    /// placeholder tokens.
    pub fn declared_release(&self) -> Option<String> {
        self.scalar_directive("Release")
    }

    /// Whether the unit builds an architecture-independent artifact.
    pub fn is_noarch(&self) -> bool {
        self.scalar_directive("BuildArch")
            .is_some_and(|value| value.eq_ignore_ascii_case("noarch"))
    }

    fn scalar_directive(&self, keyword: &str) -> Option<String> {
        self.text.lines().find_map(|line| {
            let line = strip_comment(line).trim();
            let value = line.strip_prefix(keyword)?.strip_prefix(':')?.trim();
            if value.is_empty() || value.contains("%{") {
                return None;
            }
            Some(value.to_owned())
        })
    }
}

/// Replace `%{version}` and `%{release}` placeholder tokens.
pub fn substitute_tokens(value: &str, version: &str, release: &str) -> String {
    value
        .replace("%{version}", version)
        .replace("%{release}", release)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_directive(line: &str) -> Option<Directive> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("Requires:") {
        let name = rest.trim();
        if !name.is_empty() {
            return Some(Directive::Requires(name.to_owned()));
        }
        return None;
    }

    if let Some((index, value)) = parse_indexed(line, "Source") {
        return Some(Directive::Source { index, value });
    }
    if let Some((index, value)) = parse_indexed(line, "Patch") {
        return Some(Directive::Patch { index, value });
    }

    None
}

/// Match `<keyword><digits?>: <value>`, e.g. `Source0:` or bare `Patch:`.
fn parse_indexed(line: &str, keyword: &str) -> Option<(u32, String)> {
    let rest = line.strip_prefix(keyword)?;
    let (digits, value) = rest.split_once(':')?;
    let digits = digits.trim();
    let index = if digits.is_empty() {
        0
    } else {
        digits.parse().ok()?
    };
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((index, value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
Summary: Web server unit
Name: webserver
Version: 2.1
Release: 3
BuildArch: noarch

Requires: base-config
Requires: httpd-extras   # provided by a sibling unit
Source0: http://downloads.example.com/httpd-%{version}.tar.gz
Source1: local-tuning.conf
Patch0: fix-paths.patch
# Requires: commented-out
"#;

    #[test]
    fn scans_directives_in_order() {
        let unit = PackagingUnit::new("webserver", "webserver.spec", SPEC);
        let directives = unit.directives();
        assert_eq!(
            directives,
            vec![
                Directive::Requires("base-config".to_owned()),
                Directive::Requires("httpd-extras".to_owned()),
                Directive::Source {
                    index: 0,
                    value: "http://downloads.example.com/httpd-%{version}.tar.gz".to_owned(),
                },
                Directive::Source {
                    index: 1,
                    value: "local-tuning.conf".to_owned(),
                },
                Directive::Patch {
                    index: 0,
                    value: "fix-paths.patch".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn trailing_comments_are_stripped_before_matching() {
        let unit = PackagingUnit::new("u", "u.spec", "Requires: real # not: this\n");
        assert_eq!(unit.requires(), vec!["real"]);
    }

    #[test]
    fn fully_commented_lines_are_ignored() {
        let unit = PackagingUnit::new("u", "u.spec", "# Requires: ghost\n");
        assert!(unit.directives().is_empty());
    }

    #[test]
    fn declared_version_release_and_noarch() {
        let unit = PackagingUnit::new("webserver", "webserver.spec", SPEC);
        assert_eq!(unit.declared_version().as_deref(), Some("2.1"));
        assert_eq!(unit.declared_release().as_deref(), Some("3"));
        assert!(unit.is_noarch());
    }

    #[test]
    fn placeholder_version_is_not_reported_as_declared() {
        let unit = PackagingUnit::new("u", "u.spec", "Version: %{version}\n");
        assert_eq!(unit.declared_version(), None);
    }

    #[test]
    fn build_requires_is_not_a_requires_directive() {
        let unit = PackagingUnit::new("u", "u.spec", "BuildRequires: gcc\n");
        assert!(unit.requires().is_empty());
    }

    #[test]
    fn bare_and_indexed_source_forms_both_match() {
        let unit = PackagingUnit::new("u", "u.spec", "Source: a.tar.gz\nSource12: b.tar.gz\n");
        assert_eq!(
            unit.directives(),
            vec![
                Directive::Source {
                    index: 0,
                    value: "a.tar.gz".to_owned(),
                },
                Directive::Source {
                    index: 12,
                    value: "b.tar.gz".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn substitutes_version_and_release_tokens() {
        assert_eq!(
            substitute_tokens("http://x/%{version}.tar.gz", "2.1", "3"),
            "http://x/2.1.tar.gz"
        );
        assert_eq!(
            substitute_tokens("name-%{version}-%{release}.patch", "2.1", "3"),
            "name-2.1-3.patch"
        );
    }

    #[test]
    fn loads_unit_from_spec_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.spec");
        fs::write(&path, "Requires: base\n").unwrap();

        let unit = PackagingUnit::from_spec_file(&path).unwrap();
        assert_eq!(unit.name, "tools");
        assert_eq!(unit.requires(), vec!["base"]);
    }
}
