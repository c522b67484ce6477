use super::{json_pretty, open_session, EXIT_DEFINITION_ERROR, EXIT_SUCCESS};
use console::Style;
use millwright_schema::BuildDefaults;
use std::path::Path;

/// Check every loaded definition, reporting all failures rather than
/// stopping at the first.
pub fn run(root: &Path, defaults: &BuildDefaults, json: bool) -> Result<u8, String> {
    let session = open_session(root, defaults)?;

    let mut problems: Vec<(String, String)> = session
        .load_failures()
        .iter()
        .map(|failure| (failure.path.display().to_string(), failure.error.to_string()))
        .collect();

    for (name, definition) in session.definitions() {
        if let Err(error) = definition.validate() {
            problems.push((name.clone(), error.to_string()));
        }
    }
    // Resolution-level checks: broken includes surface here.
    let report = session.resolve_all(&[]);
    for failure in &report.failures {
        if !problems.iter().any(|(name, _)| *name == failure.name) {
            problems.push((failure.name.clone(), failure.error.clone()));
        }
    }

    if json {
        let payload: Vec<_> = problems
            .iter()
            .map(|(subject, error)| serde_json::json!({"subject": subject, "error": error}))
            .collect();
        println!("{}", json_pretty(&payload)?);
    } else if problems.is_empty() {
        println!(
            "{} {} appliance definitions valid",
            Style::new().green().apply_to("ok:"),
            session.definitions().len()
        );
    } else {
        for (subject, error) in &problems {
            println!(
                "{} {subject}: {error}",
                Style::new().red().apply_to("invalid:")
            );
        }
    }

    if problems.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_DEFINITION_ERROR)
    }
}
