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


//! Database storage and models
//!
//! SQLite through sqlx. The schema is normalized: books reference a
//! publisher and a shelf, and link to categories and authors through
//! junction tables. Publishers, categories and authors are unique by their
//! normalized name, shelves by code.
//!
//! # Database Schema
//! - books: one row per ISBN
//! - publishers, categories, authors: named reference entities
//! - shelves: physical locations
//! - book_categories, book_authors: many-to-many links
//!
//! # Usage Example
//! ```no_run
//! use catalog_sync::storage::{queries, Database, EntityKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./library.db").await?;
//!
//! let mut conn = db.pool().acquire().await?;
//! let publisher = queries::resolve_or_create(&mut conn, EntityKind::Publisher, "Penguin").await?;
//! drop(conn);
//!
//! let counts = db.counts().await?;
//! println!("{} publisher(s), created: {}", counts.publishers, publisher.created);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::{
    Book, EntityKind, NamedEntity, NewBook, Resolved, Shelf, TableCounts,
};
