use crate::loader::{load_definitions, load_units, LoadFailure};
use crate::CoreError;
use millwright_graph::{Assembler, BuildLayout, PackagingUnit, PrerequisiteEdge, ProvidesRegistry};
use millwright_schema::{resolve, BuildDefaults, RawDefinition, ResolvedConfig};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One build invocation over a project tree.
///
/// Owns the loaded definitions, the pending packaging units, the provides
/// registry, and the accumulated edge set. The registry and edge set live
/// exactly as long as the session; nothing here is process-global, so
/// several sessions can run in one process without sharing state.
pub struct BuildSession {
    project_root: PathBuf,
    defaults: BuildDefaults,
    layout: BuildLayout,
    definitions: BTreeMap<String, RawDefinition>,
    units: BTreeMap<String, PackagingUnit>,
    registry: ProvidesRegistry,
    edges: BTreeSet<PrerequisiteEdge>,
    assembled: BTreeSet<String>,
    strict_requires: bool,
    load_failures: Vec<LoadFailure>,
}

/// Everything the external build-task engine needs for one appliance: the
/// merged configuration, the appliance output paths, and the prerequisite
/// edges contributed by its packaging units.
#[derive(Debug, Serialize)]
pub struct AppliancePlan {
    pub config: ResolvedConfig,
    pub disk_image: PathBuf,
    pub descriptor: PathBuf,
    pub edges: BTreeSet<PrerequisiteEdge>,
}

/// Outcome of resolving a set of appliances; failures are collected so one
/// appliance never blocks its siblings.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub started_at: String,
    pub resolved: Vec<ResolvedConfig>,
    pub failures: Vec<ResolutionFailure>,
}

#[derive(Debug, Serialize)]
pub struct ResolutionFailure {
    pub name: String,
    pub error: String,
}

impl BuildSession {
    pub fn new(project_root: impl Into<PathBuf>, defaults: BuildDefaults) -> Self {
        let project_root = project_root.into();
        let layout = BuildLayout::new(
            project_root.join("build"),
            &defaults.arch,
            &defaults.os_name,
            &defaults.os_version,
        )
        .with_source_root(&project_root);
        Self {
            project_root,
            defaults,
            layout,
            definitions: BTreeMap::new(),
            units: BTreeMap::new(),
            registry: ProvidesRegistry::new(),
            edges: BTreeSet::new(),
            assembled: BTreeSet::new(),
            strict_requires: false,
            load_failures: Vec::new(),
        }
    }

    /// Warn about `Requires:` names no known unit provides. The permissive
    /// no-edge behavior is unchanged; this only surfaces the assumption.
    pub fn with_strict_requires(mut self, strict: bool) -> Self {
        self.strict_requires = strict;
        self
    }

    /// Load appliance definitions from `<root>/appliances` and packaging
    /// units from `<root>/specs`. Per-file failures are collected, not
    /// fatal.
    pub fn load(&mut self) -> Result<(), CoreError> {
        let (definitions, mut definition_failures) =
            load_definitions(&self.project_root.join("appliances"))?;
        let (units, mut unit_failures) = load_units(&self.project_root.join("specs"))?;

        info!(
            "loaded {} appliance definitions and {} packaging units",
            definitions.len(),
            units.len()
        );
        self.definitions = definitions;
        self.units = units;
        self.load_failures.append(&mut definition_failures);
        self.load_failures.append(&mut unit_failures);
        Ok(())
    }

    pub fn add_definition(&mut self, definition: RawDefinition) -> Result<(), CoreError> {
        definition.validate()?;
        let name = definition
            .effective_name()
            .map(str::to_owned)
            .unwrap_or_default();
        self.definitions.insert(name, definition);
        Ok(())
    }

    pub fn add_unit(&mut self, unit: PackagingUnit) {
        self.units.entry(unit.name.clone()).or_insert(unit);
    }

    pub fn appliance_names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    pub fn definitions(&self) -> &BTreeMap<String, RawDefinition> {
        &self.definitions
    }

    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    pub fn registry(&self) -> &ProvidesRegistry {
        &self.registry
    }

    pub fn edges(&self) -> &BTreeSet<PrerequisiteEdge> {
        &self.edges
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Resolve one appliance's merged configuration.
    pub fn resolve(&self, name: &str) -> Result<ResolvedConfig, CoreError> {
        Ok(resolve(&self.definitions, name, &self.defaults)?)
    }

    /// Resolve every requested appliance (all loaded ones when `requested`
    /// is empty), collecting failures instead of stopping at the first.
    pub fn resolve_all(&self, requested: &[String]) -> SessionReport {
        let names = if requested.is_empty() {
            self.appliance_names()
        } else {
            requested.to_vec()
        };

        let mut resolved = Vec::new();
        let mut failures = Vec::new();
        for name in names {
            match self.resolve(&name) {
                Ok(config) => resolved.push(config),
                Err(error) => {
                    warn!("resolution of appliance '{name}' failed: {error}");
                    failures.push(ResolutionFailure {
                        name,
                        error: error.to_string(),
                    });
                }
            }
        }

        SessionReport {
            started_at: chrono::Utc::now().to_rfc3339(),
            resolved,
            failures,
        }
    }

    /// Resolve `name` and assemble the build graph for its packaging units:
    /// the appliance's own synthesized unit, every sibling appliance's unit,
    /// and transitively whatever those require.
    pub fn plan(&mut self, name: &str) -> Result<AppliancePlan, CoreError> {
        let config = self.resolve(name)?;

        // Synthesize package units for the whole chain first, so the root
        // unit's requirements on its siblings resolve to real artifacts.
        for sibling in &config.appliances {
            match self.resolve(sibling) {
                Ok(sibling_config) => self.add_synthesized_unit(&sibling_config),
                // Chain membership guarantees the definition exists; a
                // structural failure here is already reported per appliance.
                Err(error) => warn!("skipping sibling '{sibling}': {error}"),
            }
        }
        self.add_synthesized_unit(&config);

        let before = self.edges.clone();
        self.assemble_unit(&config.name, &config.version, &config.release);
        let edges: BTreeSet<PrerequisiteEdge> =
            self.edges.difference(&before).cloned().collect();

        let output_layout = self.layout_for(&config);
        Ok(AppliancePlan {
            disk_image: output_layout.disk_image_path(&config.name, "raw"),
            descriptor: output_layout.descriptor_path(&config.name),
            edges,
            config,
        })
    }

    /// Assemble one packaging unit, first recursing into the units it
    /// requires. Each unit is marked before any recursion and registered
    /// before its edges are derived, so mutually-requiring units terminate
    /// and resolve each other's artifact paths.
    pub fn assemble_unit(&mut self, name: &str, version: &str, release: &str) {
        if !self.assembled.insert(name.to_owned()) {
            return;
        }
        let Some(unit) = self.units.get(name).cloned() else {
            debug!("no packaging unit named '{name}', nothing to assemble");
            return;
        };

        {
            let assembler = Assembler::new(&self.layout, &self.registry);
            let artifact = assembler.artifact_path(&unit, version, release);
            let unit_version = unit
                .declared_version()
                .unwrap_or_else(|| version.to_owned());
            let unit_release = unit
                .declared_release()
                .unwrap_or_else(|| release.to_owned());
            self.registry.register(
                &unit.name,
                format!("{}-{unit_version}-{unit_release}", unit.name),
                artifact,
            );
        }

        for required in unit.requires() {
            if self.units.contains_key(&required) {
                self.assemble_unit(&required, version, release);
            }
        }

        let edges = Assembler::new(&self.layout, &self.registry)
            .with_strict_requires(self.strict_requires)
            .assemble(&unit, version, release);
        self.edges.extend(edges);
    }

    /// Output layout for one resolved appliance, keyed by its own merged
    /// arch and OS rather than the session target.
    pub fn layout_for(&self, config: &ResolvedConfig) -> BuildLayout {
        BuildLayout::new(
            self.project_root.join("build"),
            &config.hardware.arch,
            &config.os.name,
            &config.os.version,
        )
        .with_source_root(&self.project_root)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.layout.root().join(".lock")
    }

    fn add_synthesized_unit(&mut self, config: &ResolvedConfig) {
        // An explicit spec for the appliance takes precedence over the
        // synthesized one.
        if !self.units.contains_key(&config.name) {
            let text = appliance_spec_text(config);
            let spec_path = self.layout.specs_dir().join(format!("{}.spec", config.name));
            self.units
                .insert(config.name.clone(), PackagingUnit::new(&config.name, spec_path, text));
        }
    }
}

/// Synthesize the package spec for an appliance itself: its source archive
/// (staged by the external source-archive task) plus a requirement on every
/// sibling appliance packaged alongside it.
pub fn appliance_spec_text(config: &ResolvedConfig) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Summary: {}", config.summary);
    let _ = writeln!(text, "Name: {}", config.name);
    let _ = writeln!(text, "Version: {}", config.version);
    let _ = writeln!(text, "Release: {}", config.release);
    let _ = writeln!(text, "BuildArch: noarch");
    let _ = writeln!(text, "Source0: {}-%{{version}}.tar.gz", config.name);
    for sibling in &config.appliances {
        let _ = writeln!(text, "Requires: {sibling}");
    }
    text
}
