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


//! Book importer
//!
//! Turns one [`BookRecord`] into rows. All writes for a record happen in a
//! single transaction:
//!
//! 1. Skip if the ISBN is already present
//! 2. Resolve-or-create the publisher
//! 3. Insert the book
//! 4. Resolve-or-create each category and link it
//! 5. Resolve-or-create each author and link it
//! 6. Assign the shelf derived from the primary category
//!
//! Any failure rolls the whole record back.

use crate::config::ShelfMap;
use crate::error::{Result, SyncError};
use crate::storage::models::{EntityKind, NewBook};
use crate::storage::queries::{self, normalized_key};
use crate::sync::normalize;
use crate::sync::record::BookRecord;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a record was not inserted without being a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A book with this ISBN already exists
    Duplicate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// Result of importing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { book_id: i64, shelf: String },
    Skipped(SkipReason),
}

/// Reference rows created by committed imports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCounts {
    pub publishers: usize,
    pub categories: usize,
    pub authors: usize,
    pub shelves: usize,
}

impl CreatedCounts {
    fn record(&mut self, kind: RefKind) {
        match kind {
            RefKind::Entity(EntityKind::Publisher) => self.publishers += 1,
            RefKind::Entity(EntityKind::Category) => self.categories += 1,
            RefKind::Entity(EntityKind::Author) => self.authors += 1,
            RefKind::Shelf => self.shelves += 1,
        }
    }

    fn add(&mut self, other: &CreatedCounts) {
        self.publishers += other.publishers;
        self.categories += other.categories;
        self.authors += other.authors;
        self.shelves += other.shelves;
    }

    /// Counts accumulated since `earlier`
    pub fn since(&self, earlier: &CreatedCounts) -> CreatedCounts {
        CreatedCounts {
            publishers: self.publishers - earlier.publishers,
            categories: self.categories - earlier.categories,
            authors: self.authors - earlier.authors,
            shelves: self.shelves - earlier.shelves,
        }
    }
}

// ============================================================================
// REFERENCE CACHE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RefKind {
    Entity(EntityKind),
    Shelf,
}

type RefKey = (RefKind, String);

/// Name -> id cache for one run
///
/// Ids resolved inside an open transaction are staged; they only become
/// visible to later records once that transaction commits. A rolled back
/// record may have created the rows it staged, so those ids must not leak.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    committed: HashMap<RefKey, i64>,
    staged: HashMap<RefKey, i64>,
    created: CreatedCounts,
    staged_created: CreatedCounts,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &RefKey) -> Option<i64> {
        self.staged.get(key).or_else(|| self.committed.get(key)).copied()
    }

    fn stage(&mut self, key: RefKey, id: i64, created: bool) {
        if created {
            self.staged_created.record(key.0);
        }
        self.staged.insert(key, id);
    }

    fn commit(&mut self) {
        self.committed.extend(self.staged.drain());
        self.created.add(&self.staged_created);
        self.staged_created = CreatedCounts::default();
    }

    fn discard(&mut self) {
        self.staged.clear();
        self.staged_created = CreatedCounts::default();
    }

    /// True when no committed entries are cached
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Reference rows created by committed imports
    pub fn created(&self) -> CreatedCounts {
        self.created
    }
}

// ============================================================================
// VALIDATED RECORD
// ============================================================================

/// A record that passed validation, with every field cleaned up
#[derive(Debug, Clone)]
struct PreparedBook {
    book: NewBook,
    publisher: Option<String>,
    categories: Vec<String>,
    authors: Vec<String>,
}

impl PreparedBook {
    fn from_record(record: &BookRecord) -> Result<Self> {
        let isbn = required(record.isbn_value(), "isbn")?;
        let title = required(record.title.as_deref(), "title")?;

        let mut book = NewBook::new(isbn, title);
        book.subtitle = normalize::optional_text(record.subtitle.as_deref());
        book.description = normalize::optional_text(record.description.as_deref());
        book.publish_year = record.published_year;
        book.language = record.language.as_deref().and_then(normalize::language_name);
        book.cover_url = normalize::optional_text(record.cover_value());
        book.source_id = normalize::optional_text(record.source_id.as_deref());
        book.identifier_type = normalize::optional_text(record.identifier_type.as_deref());

        Ok(Self {
            book,
            publisher: record.publisher_name(),
            categories: record.category_names(),
            authors: record.author_names(),
        })
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(SyncError::missing_field(field)),
    }
}

// ============================================================================
// IMPORTER
// ============================================================================

/// Inserts records one at a time, each in its own transaction
pub struct BookImporter {
    pool: SqlitePool,
    shelves: ShelfMap,
    cache: ReferenceCache,
}

impl BookImporter {
    pub fn new(pool: SqlitePool, shelves: ShelfMap) -> Self {
        Self {
            pool,
            shelves,
            cache: ReferenceCache::new(),
        }
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Import a single record
    ///
    /// # Returns
    /// `Inserted` with the new book id and shelf code, or
    /// `Skipped(Duplicate)` when the ISBN already exists
    ///
    /// # Errors
    /// - `MissingRequiredField` when ISBN or title is absent; nothing is written
    /// - storage errors from any step; the record is rolled back
    pub async fn insert_book(&mut self, record: &BookRecord) -> Result<InsertOutcome> {
        let prepared = PreparedBook::from_record(record)?;

        let mut tx = self.pool.begin().await?;

        let outcome = match self.write_book(&mut tx, &prepared).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.cache.discard();
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(isbn = %prepared.book.isbn, "rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            self.cache.discard();
            return Err(e.into());
        }
        self.cache.commit();

        match &outcome {
            InsertOutcome::Inserted { book_id, shelf } => {
                info!("Inserted: {} (book_id={}, shelf={})", prepared.book.title, book_id, shelf);
            }
            InsertOutcome::Skipped(reason) => {
                info!(
                    "Book already exists: {} (ISBN: {}, {})",
                    prepared.book.title, prepared.book.isbn, reason
                );
            }
        }

        Ok(outcome)
    }

    async fn write_book(&mut self, conn: &mut SqliteConnection, prepared: &PreparedBook) -> Result<InsertOutcome> {
        if queries::find_book_id_by_isbn(conn, &prepared.book.isbn).await?.is_some() {
            return Ok(InsertOutcome::Skipped(SkipReason::Duplicate));
        }

        let mut book = prepared.book.clone();
        if let Some(publisher) = &prepared.publisher {
            book.publisher_id = Some(self.resolve(conn, EntityKind::Publisher, publisher).await?);
        }

        let book_id = queries::insert_book(conn, &book).await?;

        for category in &prepared.categories {
            let category_id = self.resolve(conn, EntityKind::Category, category).await?;
            queries::link_book_category(conn, book_id, category_id).await?;
        }

        for author in &prepared.authors {
            let author_id = self.resolve(conn, EntityKind::Author, author).await?;
            queries::link_book_author(conn, book_id, author_id).await?;
        }

        let primary = prepared.categories.first().map(String::as_str);
        let shelf = self.shelves.shelf_for(primary).to_string();
        let shelf_id = self.resolve_shelf(conn, &shelf).await?;
        queries::assign_book_shelf(conn, book_id, shelf_id).await?;

        Ok(InsertOutcome::Inserted { book_id, shelf })
    }

    async fn resolve(&mut self, conn: &mut SqliteConnection, kind: EntityKind, name: &str) -> Result<i64> {
        let key = (RefKind::Entity(kind), normalized_key(name));
        if let Some(id) = self.cache.get(&key) {
            return Ok(id);
        }

        let resolved = queries::resolve_or_create(conn, kind, name).await?;
        if resolved.created {
            debug!("Created {}: {}", kind, name);
        }
        self.cache.stage(key, resolved.id, resolved.created);

        Ok(resolved.id)
    }

    async fn resolve_shelf(&mut self, conn: &mut SqliteConnection, code: &str) -> Result<i64> {
        let key = (RefKind::Shelf, code.to_string());
        if let Some(id) = self.cache.get(&key) {
            return Ok(id);
        }

        let resolved = queries::resolve_or_create_shelf(conn, code).await?;
        if resolved.created {
            debug!("Created shelf: {}", code);
        }
        self.cache.stage(key, resolved.id, resolved.created);

        Ok(resolved.id)
    }
}
