use super::{json_pretty, open_session, EXIT_SUCCESS};
use console::Style;
use millwright_core::BuildLock;
use millwright_schema::BuildDefaults;
use std::path::Path;

pub fn run(
    root: &Path,
    defaults: &BuildDefaults,
    appliance: &str,
    strict_requires: bool,
    json: bool,
) -> Result<u8, String> {
    let mut session =
        open_session(root, defaults)?.with_strict_requires(strict_requires);
    let _lock = BuildLock::acquire(&session.lock_path()).map_err(|e| e.to_string())?;
    session.layout().initialize().map_err(|e| e.to_string())?;

    let plan = session.plan(appliance).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&plan)?);
        return Ok(EXIT_SUCCESS);
    }

    let bold = Style::new().bold();
    println!(
        "{} {} ({})",
        bold.apply_to("plan for:"),
        plan.config.name,
        plan.config.version_with_release()
    );
    println!("disk image: {}", plan.disk_image.display());
    println!("descriptor: {}", plan.descriptor.display());
    if plan.edges.is_empty() {
        println!("no prerequisite edges");
    } else {
        println!("{} prerequisite edges:", plan.edges.len());
        for edge in &plan.edges {
            println!("  {edge}");
        }
    }
    Ok(EXIT_SUCCESS)
}
