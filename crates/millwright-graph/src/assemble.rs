//! Derivation of prerequisite edges for packaging units.
//!
//! Assembly is pure graph construction: the only I/O is the read-only cache
//! probe implied by edge targets. Execution of the resulting edges
//! (downloading, copying, invoking packaging tools) belongs to the external
//! build-task engine.

use crate::edge::{Prerequisite, PrerequisiteEdge};
use crate::layout::BuildLayout;
use crate::registry::ProvidesRegistry;
use crate::unit::{substitute_tokens, Directive, PackagingUnit};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const REMOTE_SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// Derives prerequisite edges for packaging units against a shared registry
/// and build layout.
pub struct Assembler<'a> {
    layout: &'a BuildLayout,
    registry: &'a ProvidesRegistry,
    /// When set, unresolved `Requires:` names are logged. They still produce
    /// no edge and no error: an absent name is assumed satisfied externally
    /// (by the base OS).
    strict_requires: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(layout: &'a BuildLayout, registry: &'a ProvidesRegistry) -> Self {
        Self {
            layout,
            registry,
            strict_requires: false,
        }
    }

    pub fn with_strict_requires(mut self, strict: bool) -> Self {
        self.strict_requires = strict;
        self
    }

    /// The artifact path `unit` will build to, under the session fallbacks
    /// for version and release.
    pub fn artifact_path(&self, unit: &PackagingUnit, version: &str, release: &str) -> PathBuf {
        let version = unit.declared_version().unwrap_or_else(|| version.to_owned());
        let release = unit.declared_release().unwrap_or_else(|| release.to_owned());
        let arch = self.unit_arch(unit);
        self.layout
            .artifact_path(&unit.name, &version, &release, arch)
    }

    /// Register `unit` in the provides registry, then derive the prerequisite
    /// edges of its output artifact.
    ///
    /// Registration happens before edge derivation, so mutually-requiring
    /// units resolve each other once both have been constructed, without
    /// ordering constraints and without recursion hanging on cycles.
    /// `version` and `release` are fallbacks for units that do not declare
    /// their own, and feed `%{version}`/`%{release}` substitution.
    pub fn assemble(
        &self,
        unit: &PackagingUnit,
        version: &str,
        release: &str,
    ) -> BTreeSet<PrerequisiteEdge> {
        let version = unit.declared_version().unwrap_or_else(|| version.to_owned());
        let release = unit.declared_release().unwrap_or_else(|| release.to_owned());
        let arch = self.unit_arch(unit);
        let artifact = self
            .layout
            .artifact_path(&unit.name, &version, &release, arch);

        self.registry.register(
            &unit.name,
            format!("{}-{version}-{release}", unit.name),
            artifact.clone(),
        );
        debug!(unit = %unit.name, artifact = %artifact.display(), "assembling packaging unit");

        let mut edges = BTreeSet::new();
        for directive in unit.directives() {
            match directive {
                Directive::Requires(name) => {
                    if let Some(entry) = self.registry.lookup(&name) {
                        edges.insert(PrerequisiteEdge::new(
                            artifact.clone(),
                            Prerequisite::Artifact {
                                path: entry.artifact_path,
                            },
                        ));
                    } else if self.strict_requires {
                        warn!(
                            unit = %unit.name,
                            requirement = %name,
                            "requirement is not provided by any known unit; assuming it is satisfied externally"
                        );
                    }
                }
                Directive::Source { value, .. } | Directive::Patch { value, .. } => {
                    let value = substitute_tokens(&value, &version, &release);
                    edges.insert(PrerequisiteEdge::new(
                        artifact.clone(),
                        self.source_prerequisite(&value),
                    ));
                }
            }
        }
        edges
    }

    fn unit_arch(&self, unit: &PackagingUnit) -> &str {
        if unit.is_noarch() {
            "noarch"
        } else {
            self.layout.arch()
        }
    }

    fn source_prerequisite(&self, value: &str) -> Prerequisite {
        if is_remote(value) {
            let basename = url_basename(value);
            Prerequisite::Fetch {
                url: value.to_owned(),
                cache_path: self.layout.cache_path(basename),
                staged_path: self.layout.staged_source_path(basename),
            }
        } else {
            let relative = Path::new(value);
            let basename = relative
                .file_name()
                .map_or(value, |name| name.to_str().unwrap_or(value));
            Prerequisite::Copy {
                relative: relative.to_path_buf(),
                staged_path: self.layout.staged_source_path(basename),
            }
        }
    }
}

fn is_remote(value: &str) -> bool {
    REMOTE_SCHEMES
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

fn url_basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
