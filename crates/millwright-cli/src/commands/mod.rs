pub mod list;
pub mod plan;
pub mod resolve;
pub mod validate;

use millwright_core::BuildSession;
use millwright_schema::BuildDefaults;
use std::path::Path;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_DEFINITION_ERROR: u8 = 2;
pub const EXIT_GRAPH_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Construct a session over the project root with definitions loaded.
pub fn open_session(root: &Path, defaults: &BuildDefaults) -> Result<BuildSession, String> {
    let mut session = BuildSession::new(root, defaults.clone());
    session.load().map_err(|e| e.to_string())?;
    debug!(
        "session over {} holds {} appliance definitions",
        root.display(),
        session.appliance_names().len()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_value() {
        let val = serde_json::json!({"appliance": "web"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"appliance\""));
        assert!(result.contains("\"web\""));
    }

    #[test]
    fn open_session_on_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let session = open_session(dir.path(), &BuildDefaults::default()).unwrap();
        assert!(session.appliance_names().is_empty());
    }
}
