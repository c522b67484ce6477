use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read definition file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse definition: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("appliance '{0}' has no summary")]
    MissingSummary(String),
    #[error("definition file '{0}' has an empty appliance name")]
    EmptyName(String),
    #[error("appliance '{appliance}': repo '{repo}' declares neither baseurl nor mirrorlist")]
    RepoWithoutUrl { appliance: String, repo: String },
    #[error("appliance '{appliance}': repo '{repo}' declares both baseurl and mirrorlist")]
    RepoWithBothUrls { appliance: String, repo: String },
}

/// As-authored record for one appliance, parsed from a TOML definition file.
///
/// Optional scalar fields stay `None` when the author did not set them, so
/// the composition resolver can tell "unset" apart from an explicit zero or
/// empty value. A definition is immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Names of appliances composed into this one.
    #[serde(default)]
    pub appliances: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub os: OsSection,
    #[serde(default)]
    pub hardware: HardwareSection,
    #[serde(default)]
    pub packages: PackagesSection,
    #[serde(default)]
    pub repos: Vec<RepoDefinition>,
    #[serde(default)]
    pub post: PostSection,
    /// Path the definition was loaded from; empty for in-memory definitions.
    #[serde(skip)]
    pub source: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OsSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HardwareSection {
    #[serde(default)]
    pub cpus: Option<u32>,
    /// Memory in MiB.
    #[serde(default)]
    pub memory: Option<u64>,
    /// Partition root path -> size in GiB.
    #[serde(default)]
    pub partitions: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackagesSection {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoDefinition {
    pub name: String,
    #[serde(default)]
    pub baseurl: Option<String>,
    #[serde(default)]
    pub mirrorlist: Option<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Ephemeral repos are used during the build only and are not configured
    /// inside the produced image.
    #[serde(default)]
    pub ephemeral: bool,
}

/// Post-install command lists, one per target platform.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PostSection {
    #[serde(default)]
    pub base: Vec<String>,
    #[serde(default)]
    pub ec2: Vec<String>,
    #[serde(default)]
    pub vmware: Vec<String>,
}

impl RawDefinition {
    /// The effective appliance name: the declared `name`, if any.
    ///
    /// Loading from a file fills an absent name with the file stem, so after
    /// [`parse_definition_file`] this never returns `None` for a valid file.
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Structural checks required before an appliance may be resolved.
    ///
    /// A failure here is fatal for this appliance only; it must not abort
    /// resolution of unrelated appliances in the same session.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let Some(name) = self.effective_name() else {
            return Err(DefinitionError::EmptyName(
                self.source.display().to_string(),
            ));
        };

        if self.summary.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(DefinitionError::MissingSummary(name.to_owned()));
        }

        for repo in &self.repos {
            match (&repo.baseurl, &repo.mirrorlist) {
                (None, None) => {
                    return Err(DefinitionError::RepoWithoutUrl {
                        appliance: name.to_owned(),
                        repo: repo.name.clone(),
                    });
                }
                (Some(_), Some(_)) => {
                    return Err(DefinitionError::RepoWithBothUrls {
                        appliance: name.to_owned(),
                        repo: repo.name.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}

pub fn parse_definition_str(input: &str) -> Result<RawDefinition, DefinitionError> {
    Ok(toml::from_str(input)?)
}

/// Parse an appliance definition from disk.
///
/// An absent `name` field defaults to the file stem, matching how appliances
/// are laid out on disk (`appliances/<name>/<name>.toml`).
pub fn parse_definition_file(path: impl AsRef<Path>) -> Result<RawDefinition, DefinitionError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut definition = parse_definition_str(&content)?;
    if definition.effective_name().is_none() {
        definition.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    definition.source = path.to_path_buf();
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_definition() {
        let input = r#"
name = "webserver"
summary = "Web server appliance"
appliances = ["base"]
version = "2"
release = "1"

[os]
name = "fedora"
version = "12"

[hardware]
cpus = 2
memory = 512

[hardware.partitions]
"/" = 2
"/var/www" = 4

[packages]
includes = ["httpd", "mod_ssl"]
excludes = ["sendmail"]

[[repos]]
name = "extras"
baseurl = "http://repo.example.com/extras"
ephemeral = true

[post]
base = ["systemctl enable httpd"]
ec2 = ["cloud-init status --wait"]
"#;
        let def = parse_definition_str(input).expect("should parse");
        assert_eq!(def.effective_name(), Some("webserver"));
        assert_eq!(def.appliances, vec!["base"]);
        assert_eq!(def.hardware.cpus, Some(2));
        assert_eq!(def.hardware.partitions.get("/var/www"), Some(&4));
        assert_eq!(def.packages.excludes, vec!["sendmail"]);
        assert!(def.repos[0].ephemeral);
        assert_eq!(def.post.base.len(), 1);
        assert!(def.post.vmware.is_empty());
        def.validate().expect("should validate");
    }

    #[test]
    fn parses_minimal_definition() {
        let def = parse_definition_str("summary = \"Tiny\"").unwrap();
        assert!(def.appliances.is_empty());
        assert_eq!(def.os.name, None);
        assert_eq!(def.hardware.cpus, None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"
summary = "Tiny"
no_such_field = true
"#;
        assert!(parse_definition_str(input).is_err());
    }

    #[test]
    fn missing_summary_fails_validation() {
        let def = parse_definition_str("name = \"a\"").unwrap();
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::MissingSummary(name)) if name == "a"
        ));
    }

    #[test]
    fn blank_summary_fails_validation() {
        let def = parse_definition_str("name = \"a\"\nsummary = \"  \"").unwrap();
        assert!(def.validate().is_err());
    }

    #[test]
    fn repo_without_url_fails_validation() {
        let input = r#"
name = "a"
summary = "A"

[[repos]]
name = "broken"
"#;
        let def = parse_definition_str(input).unwrap();
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::RepoWithoutUrl { repo, .. }) if repo == "broken"
        ));
    }

    #[test]
    fn file_stem_fills_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.toml");
        fs::write(&path, "summary = \"Base appliance\"").unwrap();

        let def = parse_definition_file(&path).unwrap();
        assert_eq!(def.effective_name(), Some("base"));
        assert_eq!(def.source, path);
        def.validate().unwrap();
    }
}
