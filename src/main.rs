//! `debug_modules` command-line host.
//!
//! ```bash
//! debug_modules --root ./debug_modules list
//! debug_modules dispatch cache flush --payload '{"table": "events"}'
//! debug_modules serve < requests.jsonl
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use debug_modules::config::{AppConfig, DEFAULT_CONFIG_PATH};
use debug_modules::logging::init_tracing;
use debug_modules::modules::{Dispatcher, ModuleLoader, ModuleRegistry};
use debug_modules::scripting::RhaiEngine;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "debug_modules", version, about = "Discover and drive debug modules")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Modules root, overriding the configuration
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print summaries of all loaded modules
    List,
    /// Scan the root and print loaded/skipped counts
    Scan,
    /// Run one action and print its envelope
    Dispatch {
        /// Module id
        module: String,
        /// Action name
        action: String,
        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// Print a module's interface fragment
    Interface {
        /// Module id
        module: String,
    },
    /// Answer JSON-lines requests from stdin
    Serve,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    if let Some(root) = cli.root {
        config.modules.root = root;
    }
    init_tracing(&config.logging);

    let loader = ModuleLoader::with_engine(RhaiEngine::with_limit(config.modules.max_operations));
    let registry = Arc::new(ModuleRegistry::new(config.modules.root.clone(), loader));
    let report = registry.refresh()?;

    match cli.command {
        Commands::List => print_json(&registry.list())?,
        Commands::Scan => print_json(&report)?,
        Commands::Dispatch {
            module,
            action,
            payload,
        } => {
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("--payload is not valid JSON")?;
            let envelope = Dispatcher::new(registry).dispatch(&module, &action, &payload);
            print_json(&envelope)?;
            if !envelope.success {
                std::process::exit(2);
            }
        }
        Commands::Interface { module } => print!("{}", registry.interface(&module)?),
        Commands::Serve => {
            let stdin = BufReader::new(tokio::io::stdin());
            debug_modules::serve::serve(Dispatcher::new(registry), stdin, tokio::io::stdout())
                .await?;
        }
    }

    Ok(())
}
