use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A directed "target depends on prerequisite" relationship, consumed by the
/// external incremental build engine for staleness tracking and ordering.
///
/// Edges order and compare by content so a [`BTreeSet`](std::collections::BTreeSet)
/// of them is deterministic and naturally de-duplicates re-entrant assembly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PrerequisiteEdge {
    /// The artifact path being built.
    pub target: PathBuf,
    pub prerequisite: Prerequisite,
}

/// What a target waits on before it may be built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prerequisite {
    /// Another unit's build-output artifact.
    Artifact { path: PathBuf },
    /// A download-and-stage task, keyed by `cache_path` so every unit
    /// referencing the same basename shares one idempotent fetch.
    Fetch {
        url: String,
        cache_path: PathBuf,
        staged_path: PathBuf,
    },
    /// A copy-and-stage task for a bare local source path, resolved against
    /// the ordered source roots at execution time.
    Copy {
        relative: PathBuf,
        staged_path: PathBuf,
    },
}

impl PrerequisiteEdge {
    pub fn new(target: impl Into<PathBuf>, prerequisite: Prerequisite) -> Self {
        Self {
            target: target.into(),
            prerequisite,
        }
    }
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact { path } => write!(f, "artifact {}", path.display()),
            Self::Fetch { url, cache_path, .. } => {
                write!(f, "fetch {url} (cache {})", cache_path.display())
            }
            Self::Copy { relative, .. } => write!(f, "copy {}", relative.display()),
        }
    }
}

impl fmt::Display for PrerequisiteEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.target.display(), self.prerequisite)
    }
}
