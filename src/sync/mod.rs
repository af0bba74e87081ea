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


//! Record sync pipeline
//!
//! - [`record`] - processed JSON records and document parsing
//! - [`normalize`] - field cleanup (publisher suffixes, category paths, placeholders)
//! - [`importer`] - per-record transactional insert with get-or-create resolution
//! - [`driver`] - directory walk and the run summary
//!
//! # Usage Example
//! ```no_run
//! use catalog_sync::config::SyncConfig;
//! use catalog_sync::storage::Database;
//! use catalog_sync::sync::LibrarySync;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::default();
//! let db = Database::new(&config.database).await?;
//!
//! let mut sync = LibrarySync::new(&db, &config);
//! let summary = sync.sync_directory(&config.input_dir).await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod importer;
pub mod normalize;
pub mod record;

pub use driver::{LibrarySync, SyncFailure, SyncSummary};
pub use importer::{BookImporter, CreatedCounts, InsertOutcome, ReferenceCache, SkipReason};
pub use record::{parse_document, BookRecord};
