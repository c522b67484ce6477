use crate::CoreError;
use millwright_graph::PackagingUnit;
use millwright_schema::{parse_definition_file, RawDefinition};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One file that failed to load. Collected, never fatal to sibling files.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: CoreError,
}

/// Recursively load every `*.toml` appliance definition under `dir`.
///
/// A missing directory yields an empty set. Parse failures are collected per
/// file; on duplicate appliance names the first loaded definition wins.
pub fn load_definitions(
    dir: &Path,
) -> Result<(BTreeMap<String, RawDefinition>, Vec<LoadFailure>), CoreError> {
    let mut definitions = BTreeMap::new();
    let mut failures = Vec::new();

    for path in collect_files(dir, "toml")? {
        match parse_definition_file(&path) {
            Ok(definition) => {
                let Some(name) = definition.effective_name().map(str::to_owned) else {
                    // Unreachable for file-loaded definitions, which fall
                    // back to the file stem.
                    continue;
                };
                if definitions.contains_key(&name) {
                    warn!(
                        "duplicate definition for appliance '{name}' at {}, keeping first",
                        path.display()
                    );
                    continue;
                }
                debug!("loaded appliance definition '{name}' from {}", path.display());
                definitions.insert(name, definition);
            }
            Err(error) => failures.push(LoadFailure {
                path,
                error: error.into(),
            }),
        }
    }

    Ok((definitions, failures))
}

/// Recursively load every `*.spec` packaging unit under `dir`.
pub fn load_units(
    dir: &Path,
) -> Result<(BTreeMap<String, PackagingUnit>, Vec<LoadFailure>), CoreError> {
    let mut units = BTreeMap::new();
    let mut failures = Vec::new();

    for path in collect_files(dir, "spec")? {
        match PackagingUnit::from_spec_file(&path) {
            Ok(unit) => {
                if units.contains_key(&unit.name) {
                    warn!(
                        "duplicate packaging unit '{}' at {}, keeping first",
                        unit.name,
                        path.display()
                    );
                    continue;
                }
                debug!("loaded packaging unit '{}' from {}", unit.name, path.display());
                units.insert(unit.name.clone(), unit);
            }
            Err(error) => failures.push(LoadFailure {
                path,
                error: error.into(),
            }),
        }
    }

    Ok((units, failures))
}

fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, CoreError> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    walk(dir, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<(), CoreError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, extension, files)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_definitions_from_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base_dir = dir.path().join("base");
        fs::create_dir_all(&base_dir).unwrap();
        fs::write(base_dir.join("base.toml"), "summary = \"Base\"").unwrap();
        fs::write(dir.path().join("web.toml"), "summary = \"Web\"").unwrap();

        let (definitions, failures) = load_definitions(dir.path()).unwrap();
        assert!(failures.is_empty());
        assert_eq!(
            definitions.keys().collect::<Vec<_>>(),
            vec!["base", "web"]
        );
    }

    #[test]
    fn malformed_file_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.toml"), "summary = \"Good\"").unwrap();
        fs::write(dir.path().join("bad.toml"), "summary = [not toml").unwrap();

        let (definitions, failures) = load_definitions(dir.path()).unwrap();
        assert!(definitions.contains_key("good"));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].path.ends_with("bad.toml"));
    }

    #[test]
    fn missing_directory_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (definitions, failures) = load_definitions(&dir.path().join("nowhere")).unwrap();
        assert!(definitions.is_empty());
        assert!(failures.is_empty());
    }

    #[test]
    fn loads_spec_units() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tools.spec"), "Requires: base\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (units, failures) = load_units(dir.path()).unwrap();
        assert!(failures.is_empty());
        assert_eq!(units.len(), 1);
        assert!(units.contains_key("tools"));
    }
}
