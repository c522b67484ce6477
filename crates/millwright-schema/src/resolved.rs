use crate::definition::{PostSection, RepoDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fully merged configuration for one appliance.
///
/// Produced once per appliance request by the composition resolver and never
/// mutated downstream; template rendering and output-path derivation consume
/// it read-only. All fields are plain and explicit so consumers address them
/// statically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub name: String,
    pub summary: String,
    /// Sibling appliances packaged alongside this one: the composition chain
    /// minus the appliance itself, in traversal order.
    pub appliances: Vec<String>,
    pub os: ResolvedOs,
    pub hardware: ResolvedHardware,
    /// Union of package includes across the chain, in chain order, with
    /// excludes appended under a `-` negation marker. Not de-duplicated.
    pub packages: Vec<String>,
    pub repos: Vec<RepoDefinition>,
    pub post: PostSection,
    pub version: String,
    pub release: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedOs {
    pub name: String,
    pub version: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedHardware {
    pub arch: String,
    pub cpus: u32,
    /// MiB.
    pub memory: u64,
    /// Partition root path -> size in GiB. Always contains `/`.
    pub partitions: BTreeMap<String, u64>,
}

impl ResolvedConfig {
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Stable content digest of the resolved configuration.
    ///
    /// Lets downstream collaborators (kickstart/descriptor rendering) detect
    /// that a configuration changed since the last build.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        Ok(blake3::hash(self.canonical_json()?.as_bytes())
            .to_hex()
            .to_string())
    }

    pub fn version_with_release(&self) -> String {
        format!("{}-{}", self.version, self.release)
    }

    /// `<os-name>/<os-version>` path fragment.
    pub fn os_path(&self) -> String {
        format!("{}/{}", self.os.name, self.os.version)
    }

    /// `<arch>/<os-name>/<os-version>` path fragment keying all output paths.
    pub fn main_path(&self) -> String {
        format!("{}/{}", self.hardware.arch, self.os_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedConfig {
        ResolvedConfig {
            name: "web".to_owned(),
            summary: "Web appliance".to_owned(),
            appliances: vec!["base".to_owned()],
            os: ResolvedOs {
                name: "fedora".to_owned(),
                version: "12".to_owned(),
                password: "secret".to_owned(),
            },
            hardware: ResolvedHardware {
                arch: "x86_64".to_owned(),
                cpus: 2,
                memory: 512,
                partitions: BTreeMap::from([("/".to_owned(), 2)]),
            },
            packages: vec!["httpd".to_owned()],
            repos: Vec::new(),
            post: PostSection::default(),
            version: "1".to_owned(),
            release: "0".to_owned(),
        }
    }

    #[test]
    fn path_fragments() {
        let config = sample();
        assert_eq!(config.os_path(), "fedora/12");
        assert_eq!(config.main_path(), "x86_64/fedora/12");
        assert_eq!(config.version_with_release(), "1-0");
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = sample();
        let b = sample();
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());

        let mut c = sample();
        c.hardware.memory = 1024;
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }
}
