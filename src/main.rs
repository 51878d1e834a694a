use anyhow::Result;
use clap::Parser;
use tracing::debug;

use docset_store::{commands, logging, Config, InMemoryStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot file holding the store (overrides DOCSET_STORE_PATH)
    #[arg(short = 's', long)]
    store: Option<String>,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(store) = args.store {
        config.store.snapshot_path = Some(store);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    logging::init_logging(&config.logging)?;

    let store = InMemoryStore::from_config(&config.store).await?;
    debug!(snapshot = ?store.snapshot_path(), "store ready");

    let output = commands::execute(&store, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
