use super::{json_pretty, open_session, EXIT_SUCCESS};
use millwright_schema::BuildDefaults;
use std::path::Path;

pub fn run(root: &Path, defaults: &BuildDefaults, json: bool) -> Result<u8, String> {
    let session = open_session(root, defaults)?;
    let definitions = session.definitions();

    if json {
        let entries: Vec<_> = definitions
            .iter()
            .map(|(name, definition)| {
                serde_json::json!({
                    "name": name,
                    "summary": definition.summary,
                    "includes": definition.appliances,
                    "file": definition.source,
                })
            })
            .collect();
        println!("{}", json_pretty(&entries)?);
    } else if definitions.is_empty() {
        println!("no appliance definitions found");
    } else {
        println!("{:<20} {:<10} SUMMARY", "NAME", "INCLUDES");
        for (name, definition) in definitions {
            println!(
                "{:<20} {:<10} {}",
                name,
                definition.appliances.len(),
                definition.summary.as_deref().unwrap_or("")
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
