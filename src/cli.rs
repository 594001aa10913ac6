use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::client::{HttpAssetStore, HttpNoteSink};
use crate::load_config::load_config;
use crate::publish::Publisher;
use crate::validate::PathValidator;

/// CLI for treelink: publish a folder to an asset store and insert the
/// rendered tree into a note.
#[derive(Parser)]
#[clap(
    name = "treelink",
    version,
    about = "Upload a local folder to an asset store and insert a linked tree after an anchor block"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every file under the folder and insert the rendered tree
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Folder to upload
        #[clap(long)]
        root: PathBuf,
        /// Anchor block id to insert the rendered tree after
        #[clap(long)]
        anchor: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish {
            config,
            root,
            anchor,
        } => {
            let config = load_config(config)?;
            let store = HttpAssetStore::new(&config.asset_store);
            let sink = HttpNoteSink::new(&config.note_sink);
            let validator = PathValidator::new(config.protected_root.clone());
            let publisher = Publisher::new(
                config.limits.clone(),
                validator,
                config.asset_store.folder_id.clone(),
                store,
                sink,
            );

            println!("Publish starting...");
            match publisher.run(&root, &anchor).await {
                Ok(report) => {
                    println!("Publish complete.\nStatus:");
                    println!("{:#?}", report.status);
                    if !report.failed_paths.is_empty() {
                        eprintln!("Failed paths:");
                        for path in &report.failed_paths {
                            eprintln!("  {}", path.display());
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Publish failed: {e}");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
