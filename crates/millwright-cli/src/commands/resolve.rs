use super::{json_pretty, open_session, EXIT_SUCCESS};
use console::Style;
use millwright_schema::BuildDefaults;
use std::path::Path;

pub fn run(root: &Path, defaults: &BuildDefaults, appliance: &str, json: bool) -> Result<u8, String> {
    let session = open_session(root, defaults)?;
    let config = session.resolve(appliance).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&config)?);
        return Ok(EXIT_SUCCESS);
    }

    let bold = Style::new().bold();
    println!("{} {} ({})", bold.apply_to("appliance:"), config.name, config.summary);
    println!("version:   {}", config.version_with_release());
    println!("os:        {} {}", config.os.name, config.os.version);
    println!(
        "hardware:  {} cpus, {} MiB, arch {}",
        config.hardware.cpus, config.hardware.memory, config.hardware.arch
    );
    for (root_path, size) in &config.hardware.partitions {
        println!("partition: {root_path} ({size} GiB)");
    }
    if !config.appliances.is_empty() {
        println!("includes:  {}", config.appliances.join(", "));
    }
    if !config.packages.is_empty() {
        println!("packages:  {}", config.packages.join(" "));
    }
    for repo in &config.repos {
        let url = repo
            .baseurl
            .as_deref()
            .or(repo.mirrorlist.as_deref())
            .unwrap_or("");
        println!("repo:      {} ({url})", repo.name);
    }
    let digest = config.digest().map_err(|e| e.to_string())?;
    println!("digest:    {digest}");
    Ok(EXIT_SUCCESS)
}
