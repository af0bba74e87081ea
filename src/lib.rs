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


//! CatalogSync core library
//!
//! Loads processed book records (JSON) into a normalized SQLite catalog.
//! Publishers, categories and authors are created on first sight and reused
//! afterwards, books are deduplicated by ISBN, and every book is placed on a
//! shelf chosen from its primary category.
//!
//! # Modules
//! - [`config`] - TOML configuration and the category to shelf map
//! - [`error`] - error type shared by every module
//! - [`storage`] - database connection, schema, and queries
//! - [`sync`] - record parsing, import, and the directory sync driver

pub mod config;
pub mod error;
pub mod storage;
pub mod sync;

pub use config::{ConfigOverrides, ShelfMap, SyncConfig};
pub use error::{FailureKind, Result, SyncError};
pub use storage::Database;
pub use sync::{BookImporter, BookRecord, InsertOutcome, LibrarySync, SyncSummary};
