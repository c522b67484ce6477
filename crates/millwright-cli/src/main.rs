mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_DEFINITION_ERROR, EXIT_FAILURE, EXIT_GRAPH_ERROR};
use millwright_schema::BuildDefaults;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "millwright",
    version,
    about = "Declarative VM appliance configuration resolution and build planning"
)]
struct Cli {
    /// Project root containing appliances/, specs/, src/ and build/.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the appliance definitions found in the project.
    List,
    /// Structurally check every definition and report all failures.
    Validate,
    /// Print the fully merged configuration for one appliance.
    Resolve {
        /// Appliance name.
        appliance: String,
    },
    /// Assemble and print the prerequisite edge set for one appliance.
    Plan {
        /// Appliance name.
        appliance: String,
        /// Warn about Requires names no known unit provides.
        #[arg(long, default_value_t = false)]
        strict_requires: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MILLWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let defaults = BuildDefaults::from_env();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::List => commands::list::run(&cli.root, &defaults, json_output),
        Commands::Validate => commands::validate::run(&cli.root, &defaults, json_output),
        Commands::Resolve { appliance } => {
            commands::resolve::run(&cli.root, &defaults, &appliance, json_output)
        }
        Commands::Plan {
            appliance,
            strict_requires,
        } => commands::plan::run(&cli.root, &defaults, &appliance, strict_requires, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("definition error:") {
                EXIT_DEFINITION_ERROR
            } else if msg.starts_with("compose error:") || msg.starts_with("graph error:") {
                EXIT_GRAPH_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
