//! Composition chain expansion and field-by-field configuration merging.
//!
//! Every field of a [`ResolvedConfig`] is produced by exactly one of four
//! merge strategies, applied while walking the composition chain in
//! traversal order (the appliance itself first, then the depth-first
//! flattening of everything it transitively includes):
//!
//! | strategy        | fields                                             |
//! |-----------------|----------------------------------------------------|
//! | OVERRIDE        | os.name, os.version, os.password, version, release |
//! | MAX             | hardware.cpus, hardware.memory                     |
//! | UNION-APPEND    | packages, repos, post.base/ec2/vmware              |
//! | KEYED-MAX-MERGE | hardware.partitions (keyed by root path)           |
//!
//! OVERRIDE keeps the last non-null value in traversal order, so a nested
//! include can override the appliance that pulled it in. Adding a field to
//! the merge is one strategy call in [`resolve`].

use crate::defaults::BuildDefaults;
use crate::definition::{DefinitionError, RawDefinition};
use crate::resolved::{ResolvedConfig, ResolvedHardware, ResolvedOs};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("unknown appliance '{0}': no definition with that name is loaded")]
    UnknownRoot(String),
    #[error("unknown appliance '{name}': referenced from '{referenced_by}'")]
    UnknownInclude { name: String, referenced_by: String },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Compute the composition chain for `root`: root first, then the
/// de-duplicated depth-first flattening of its transitive includes.
///
/// A member's own includes are visited before the next sibling, each name is
/// recorded on first sight, and repeats are skipped, so the first occurrence
/// wins its position. Declaration order within each include list is
/// preserved.
pub fn composition_chain(
    definitions: &BTreeMap<String, RawDefinition>,
    root: &str,
) -> Result<Vec<String>, ComposeError> {
    if !definitions.contains_key(root) {
        return Err(ComposeError::UnknownRoot(root.to_owned()));
    }

    let mut chain = Vec::new();
    let mut seen = BTreeSet::new();
    expand(definitions, root, &mut chain, &mut seen)?;
    Ok(chain)
}

fn expand(
    definitions: &BTreeMap<String, RawDefinition>,
    name: &str,
    chain: &mut Vec<String>,
    seen: &mut BTreeSet<String>,
) -> Result<(), ComposeError> {
    if !seen.insert(name.to_owned()) {
        return Ok(());
    }
    chain.push(name.to_owned());

    let definition = &definitions[name];
    for included in &definition.appliances {
        if seen.contains(included) {
            continue;
        }
        if !definitions.contains_key(included) {
            return Err(ComposeError::UnknownInclude {
                name: included.clone(),
                referenced_by: definition.source.display().to_string(),
            });
        }
        expand(definitions, included, chain, seen)?;
    }
    Ok(())
}

/// Resolve the final merged configuration for `root`.
///
/// Fails if `root` or any transitively included name is missing from
/// `definitions`, or if the root definition fails its structural checks.
/// Resolution is pure: resolving the same appliance twice against an
/// unchanged definition set yields identical output.
pub fn resolve(
    definitions: &BTreeMap<String, RawDefinition>,
    root: &str,
    defaults: &BuildDefaults,
) -> Result<ResolvedConfig, ComposeError> {
    let chain = composition_chain(definitions, root)?;

    let root_definition = &definitions[root];
    root_definition.validate()?;

    let mut os = ResolvedOs {
        name: defaults.os_name.clone(),
        version: defaults.os_version.clone(),
        password: defaults.os_password.clone(),
    };
    let mut version = defaults.version.clone();
    let mut release = defaults.release.clone();
    let mut cpus: u32 = 0;
    let mut memory: u64 = 0;
    let mut partitions: BTreeMap<String, u64> = BTreeMap::new();
    let mut packages: Vec<String> = Vec::new();
    let mut repos = Vec::new();
    let mut post = crate::definition::PostSection::default();

    for member in &chain {
        let definition = &definitions[member];

        override_field(&mut os.name, definition.os.name.as_deref());
        override_field(&mut os.version, definition.os.version.as_deref());
        override_field(&mut os.password, definition.os.password.as_deref());
        override_field(&mut version, definition.version.as_deref());
        override_field(&mut release, definition.release.as_deref());

        max_field(&mut cpus, definition.hardware.cpus);
        max_field(&mut memory, definition.hardware.memory);

        keyed_max_merge(&mut partitions, &definition.hardware.partitions);

        union_append(&mut packages, &definition.packages.includes);
        packages.extend(
            definition
                .packages
                .excludes
                .iter()
                .map(|package| format!("-{package}")),
        );

        repos.extend(definition.repos.iter().cloned());

        union_append(&mut post.base, &definition.post.base);
        union_append(&mut post.ec2, &definition.post.ec2);
        union_append(&mut post.vmware, &definition.post.vmware);
    }

    if cpus == 0 {
        cpus = defaults.cpus;
    }
    if memory == 0 {
        memory = defaults.memory;
    }
    partitions
        .entry("/".to_owned())
        .or_insert(defaults.disk_size);

    Ok(ResolvedConfig {
        name: root.to_owned(),
        summary: root_definition.summary.clone().unwrap_or_default(),
        appliances: chain[1..].to_vec(),
        os,
        hardware: ResolvedHardware {
            arch: defaults.arch.clone(),
            cpus,
            memory,
            partitions,
        },
        packages,
        repos,
        post,
        version,
        release,
    })
}

/// OVERRIDE: replace the current value whenever the candidate is set.
fn override_field(current: &mut String, candidate: Option<&str>) {
    if let Some(value) = candidate {
        value.clone_into(current);
    }
}

/// MAX: replace only when the candidate is strictly greater.
fn max_field<T: Ord + Copy>(current: &mut T, candidate: Option<T>) {
    if let Some(value) = candidate {
        if value > *current {
            *current = value;
        }
    }
}

/// UNION-APPEND: concatenate in chain order, no de-duplication.
fn union_append(target: &mut Vec<String>, items: &[String]) {
    target.extend(items.iter().cloned());
}

/// KEYED-MAX-MERGE: insert new keys, keep the larger size on collision.
fn keyed_max_merge(partitions: &mut BTreeMap<String, u64>, incoming: &BTreeMap<String, u64>) {
    for (root_path, size) in incoming {
        partitions
            .entry(root_path.clone())
            .and_modify(|current| *current = (*current).max(*size))
            .or_insert(*size);
    }
}
