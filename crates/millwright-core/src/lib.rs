//! Build session orchestration for Millwright.
//!
//! This crate ties the schema and graph layers together into the
//! `BuildSession`: it loads appliance and packaging-unit definitions from a
//! project tree, resolves each requested appliance while isolating failures,
//! synthesizes each appliance's own package spec, and assembles the
//! prerequisite edge set handed to the external build-task engine. A
//! session-scoped provides registry replaces any process-global state, so
//! multiple sessions can coexist in one process.

pub mod loader;
pub mod lock;
pub mod session;

pub use loader::{load_definitions, load_units, LoadFailure};
pub use lock::BuildLock;
pub use session::{AppliancePlan, BuildSession, ResolutionFailure, SessionReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("definition error: {0}")]
    Definition(#[from] millwright_schema::DefinitionError),
    #[error("compose error: {0}")]
    Compose(#[from] millwright_schema::ComposeError),
    #[error("graph error: {0}")]
    Graph(#[from] millwright_graph::GraphError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("build tree is locked by another session: {0}")]
    BuildLocked(String),
}
