//! tusk — operator tool for a node's document store.
//!
//! Provisions local actors, posts notes, records followers and inspects
//! documents against the in-memory or the RocksDB backend.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use tokio_util::sync::CancellationToken;
use tusk_db::{Database, DbConfig, StoreConfig};

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "tusk", version, about = "Federated node storage core")]
struct Cli {
    /// This node's hostname (`host` or `host:port`)
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// Scheme for minted identifiers
    #[arg(long, default_value = "https")]
    scheme: String,

    /// RocksDB directory; state is in-memory for this invocation when omitted
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Default page size for collection pages
    #[arg(long)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> DbConfig {
        let mut config = DbConfig::new(self.hostname.clone());
        config.scheme = self.scheme.clone();
        if let Some(size) = self.page_size {
            config.default_page_size = size;
            config.max_page_size = config.max_page_size.max(size);
        }
        match &self.data_dir {
            Some(dir) => config.with_storage(StoreConfig::at(dir)),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let db = Database::open(cli.config())?;
    info!("Serving documents for {}", db.config().hostname);

    // Ctrl-C aborts any lock wait
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let output = commands::run(&db, cli.command, &cancel).await?;
    println!("{output}");
    Ok(())
}
