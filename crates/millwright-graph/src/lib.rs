//! Packaging-unit parsing, provides registry, and build graph assembly.
//!
//! This crate turns line-oriented packaging-unit definitions into the
//! prerequisite edges an external incremental build engine executes: edges
//! to required sibling units' artifacts and to fetch/copy staging tasks for
//! declared sources and patches. It also owns the on-disk build tree layout
//! and the artifact naming scheme.

pub mod assemble;
pub mod edge;
pub mod layout;
pub mod registry;
pub mod unit;

pub use assemble::Assembler;
pub use edge::{Prerequisite, PrerequisiteEdge};
pub use layout::{artifact_file_name, BuildLayout};
pub use registry::{ProvidesEntry, ProvidesRegistry};
pub use unit::{substitute_tokens, Directive, PackagingUnit};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spec path '{0}' has no usable file stem for a unit name")]
    InvalidSpecPath(String),
}
