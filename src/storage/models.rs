//! Database models for CatalogSync
//!
//! Row types for the catalog schema created in `migrations.rs`.
//!
//! # SQLite Adaptations
//! - Timestamps stored as TEXT (`CURRENT_TIMESTAMP`, UTC)
//! - Reference tables keep both the display name and its normalized form;
//!   uniqueness is enforced on the normalized form
//! - Many-to-many relationships use junction tables keyed on the id pair

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// ENUMS
// ============================================================================

/// Kind of reference entity resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Publisher,
    Category,
    Author,
}

impl EntityKind {
    /// Table holding this kind of entity
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Publisher => "publishers",
            EntityKind::Category => "categories",
            EntityKind::Author => "authors",
        }
    }

    /// Surrogate key column of the table
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::Publisher => "publisher_id",
            EntityKind::Category => "category_id",
            EntityKind::Author => "author_id",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Publisher => "publisher",
            EntityKind::Category => "category",
            EntityKind::Author => "author",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub book_id: i64,
    pub isbn: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub publish_year: Option<i32>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub source_id: Option<String>,
    pub identifier_type: Option<String>,
    pub publisher_id: Option<i64>,
    pub shelf_id: Option<i64>,
    pub status: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: NaiveDateTime,
}

/// New book for insertion (without auto-generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub publish_year: Option<i32>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub source_id: Option<String>,
    pub identifier_type: Option<String>,
    pub publisher_id: Option<i64>,
}

impl NewBook {
    pub fn new(isbn: String, title: String) -> Self {
        Self {
            isbn,
            title,
            subtitle: None,
            description: None,
            publish_year: None,
            language: None,
            cover_url: None,
            source_id: None,
            identifier_type: None,
            publisher_id: None,
        }
    }
}

/// Publisher, category or author row
///
/// The three reference tables share one shape, so a single row type serves
/// all of them; `id` is aliased from the table's own key column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NamedEntity {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
}

/// Shelf entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shelf {
    pub shelf_id: i64,
    pub code: String,
}

// ============================================================================
// RESOLUTION RESULTS
// ============================================================================

/// Result of a get-or-create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Surrogate id of the (existing or new) row
    pub id: i64,
    /// Whether this call inserted the row
    pub created: bool,
}

/// Row counts for every catalog table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub books: i64,
    pub publishers: i64,
    pub categories: i64,
    pub authors: i64,
    pub shelves: i64,
    pub book_categories: i64,
    pub book_authors: i64,
}
