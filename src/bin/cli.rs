// CatalogSync - Book Catalog Sync
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! catalog-sync command line tool

use anyhow::{Context, Result};
use catalog_sync::config::{ConfigOverrides, SyncConfig};
use catalog_sync::storage::Database;
use catalog_sync::sync::LibrarySync;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "catalog-sync")]
#[command(about = "Sync processed book records into the library catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every processed JSON file from a directory into the database
    Sync {
        /// Directory of processed JSON files
        #[arg(short, long, env = "CATALOG_SYNC_INPUT")]
        input: Option<PathBuf>,
        /// SQLite database file
        #[arg(short, long, env = "CATALOG_SYNC_DATABASE")]
        database: Option<PathBuf>,
        /// TOML configuration file
        #[arg(short, long, env = "CATALOG_SYNC_CONFIG")]
        config: Option<PathBuf>,
        /// Only sync files whose name starts with this prefix
        #[arg(short, long)]
        pattern: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print row counts for every catalog table
    Stats {
        /// SQLite database file
        #[arg(short, long, env = "CATALOG_SYNC_DATABASE")]
        database: Option<PathBuf>,
        /// TOML configuration file
        #[arg(short, long, env = "CATALOG_SYNC_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            input,
            database,
            config,
            pattern,
            json,
        } => {
            let overrides = ConfigOverrides {
                database,
                input_dir: input,
                file_prefix: pattern,
            };
            let config = load_config(config, overrides).await?;
            let db = open_database(&config).await?;

            info!("Syncing {} -> {}", config.input_dir.display(), config.database.display());

            let mut sync = LibrarySync::new(&db, &config);
            let summary = match sync.sync_directory(&config.input_dir).await {
                Ok(summary) => summary,
                Err(e) => {
                    error!("Sync aborted: {}", e);
                    return Err(e).context("sync aborted");
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }

            db.close().await?;
        }
        Commands::Stats { database, config } => {
            let overrides = ConfigOverrides {
                database,
                ..Default::default()
            };
            let config = load_config(config, overrides).await?;
            let db = open_database(&config).await?;

            let counts = db.counts().await.context("failed to count rows")?;
            println!("Database: {}", config.database.display());
            println!("  books:           {}", counts.books);
            println!("  publishers:      {}", counts.publishers);
            println!("  categories:      {}", counts.categories);
            println!("  authors:         {}", counts.authors);
            println!("  shelves:         {}", counts.shelves);
            println!("  book_categories: {}", counts.book_categories);
            println!("  book_authors:    {}", counts.book_authors);

            db.close().await?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<SyncConfig> {
    match SyncConfig::resolve(path.as_deref(), overrides).await {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            Err(e).context("failed to load configuration")
        }
    }
}

async fn open_database(config: &SyncConfig) -> Result<Database> {
    match Database::new(&config.database).await {
        Ok(db) => {
            info!("✓ Connected to database {}", config.database.display());
            Ok(db)
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            Err(e).with_context(|| format!("cannot open {}", config.database.display()))
        }
    }
}
