//! Appliance definition parsing, defaults, and composition resolution.
//!
//! This crate defines the schema layer of Millwright: TOML appliance
//! definition parsing (`RawDefinition`), environment-derived session
//! defaults (`BuildDefaults`), the composition resolver that merges an
//! appliance with everything it transitively includes (`resolve`), and the
//! resulting plain-record configuration (`ResolvedConfig`) with its stable
//! content digest.

pub mod compose;
pub mod defaults;
pub mod definition;
pub mod resolved;

pub use compose::{composition_chain, resolve, ComposeError};
pub use defaults::BuildDefaults;
pub use definition::{
    parse_definition_file, parse_definition_str, DefinitionError, HardwareSection, OsSection,
    PackagesSection, PostSection, RawDefinition, RepoDefinition,
};
pub use resolved::{ResolvedConfig, ResolvedHardware, ResolvedOs};
