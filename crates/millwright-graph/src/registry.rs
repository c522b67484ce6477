use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// What one packaging unit provides: its fully-qualified version identifier
/// and the path its built artifact will land at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvidesEntry {
    pub version: String,
    pub artifact_path: PathBuf,
}

/// Session-scoped lookup from a unit's name to its [`ProvidesEntry`].
///
/// Append-only for the lifetime of one build session: the first registration
/// of a name wins and later attempts are silently ignored. Register/lookup
/// are guarded by an interior mutex so assembly branches may run
/// concurrently without losing first-writer-wins determinism.
#[derive(Debug, Default)]
pub struct ProvidesRegistry {
    entries: Mutex<BTreeMap<String, ProvidesEntry>>,
}

impl ProvidesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register what `name` provides. Returns `true` if the entry was
    /// inserted, `false` if `name` was already registered (not an error).
    pub fn register(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
    ) -> bool {
        let name = name.into();
        let mut entries = self.lock();
        if entries.contains_key(&name) {
            debug!("provides entry for '{name}' already registered, keeping first");
            return false;
        }
        entries.insert(
            name,
            ProvidesEntry {
                version: version.into(),
                artifact_path: artifact_path.into(),
            },
        );
        true
    }

    pub fn lookup(&self, name: &str) -> Option<ProvidesEntry> {
        self.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ProvidesEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
