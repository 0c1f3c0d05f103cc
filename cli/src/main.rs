//! ChainShovel CLI — validate config, print or apply schema, inspect the
//! merged runtime view.
//!
//! # Commands
//! ```text
//! chainshovel validate     --config <path.json>
//! chainshovel ddl          --config <path.json>
//! chainshovel migrate      --config <path.json> [--pg-url <url>]
//! chainshovel sources      --config <path.json> [--pg-url <url>]
//! chainshovel integrations --config <path.json> [--pg-url <url>]
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chainshovel_core::{validate_fix, EventSelection, Root};
use chainshovel_storage::PostgresStore;

mod logging;

#[derive(Parser)]
#[command(
    name = "chainshovel",
    about = "Event-to-table indexer config tool",
    long_about = "
Validates integration config, derives table schema, and reconciles declared
config with config persisted in Postgres.

ENVIRONMENT VARIABLES:
  RUST_LOG   Log filter (overrides --verbose)
  Any variable referenced as \"$NAME\" in pg_url or source urls
",
    version
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = "./chainshovel.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and show the derived tables
    Validate,

    /// Print the DDL for every table in the config
    Ddl,

    /// Apply each integration's table DDL to the database
    Migrate {
        /// Postgres URL (default: pg_url from the config)
        #[arg(long)]
        pg_url: Option<String>,
    },

    /// Print declared and persisted sources merged by chain id
    Sources {
        #[arg(long)]
        pg_url: Option<String>,
    },

    /// Print declared and persisted integrations grouped by source
    Integrations {
        #[arg(long)]
        pg_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&logging::LogConfig::from_flags(cli.verbose, cli.json_logs));

    let mut conf = Root::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    validate_fix(&mut conf).context("validating config")?;

    match cli.command {
        Commands::Validate => cmd_validate(&conf),
        Commands::Ddl => {
            for stmt in chainshovel_core::ddl(&conf) {
                println!("{stmt};");
            }
            Ok(())
        }
        Commands::Migrate { pg_url } => {
            let store = connect(&conf, pg_url).await?;
            store.init_schema().await?;
            chainshovel_core::migrate(&store, &conf).await?;
            println!("✓ migrated {} integrations", conf.integrations.len());
            Ok(())
        }
        Commands::Sources { pg_url } => {
            let store = connect(&conf, pg_url).await?;
            let sources = conf.all_sources(&store).await?;
            println!("{}", serde_json::to_string_pretty(&sources)?);
            Ok(())
        }
        Commands::Integrations { pg_url } => {
            let store = connect(&conf, pg_url).await?;
            let by_src = conf.integrations_by_source(&store).await?;
            for (src, igs) in &by_src {
                println!("{src}:");
                for ig in igs {
                    let state = if ig.enabled { "enabled" } else { "disabled" };
                    println!("  - {} → {} ({state})", ig.name, ig.table.name);
                }
            }
            Ok(())
        }
    }
}

async fn connect(conf: &Root, pg_url: Option<String>) -> Result<PostgresStore> {
    let url = pg_url.unwrap_or_else(|| conf.pg_url.resolve());
    if url.is_empty() {
        bail!("no database url: set pg_url in the config or pass --pg-url");
    }
    PostgresStore::connect(&url)
        .await
        .context("connecting to postgres")
}

fn cmd_validate(conf: &Root) -> Result<()> {
    println!("✓ Config valid");
    println!("  Sources:      {}", conf.sources.len());
    println!("  Integrations: {}", conf.integrations.len());
    for ig in &conf.integrations {
        let state = if ig.enabled { "" } else { " [disabled]" };
        println!("    - {} → {}{}", ig.name, ig.table.name, state);
        println!("      selected inputs: {}", ig.event.selected().len());
        for c in &ig.table.columns {
            println!("      {} {}", c.name, c.ty);
        }
        for group in &ig.table.unique {
            println!("      unique ({})", group.join(", "));
        }
    }
    Ok(())
}
