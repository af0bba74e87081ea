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


//! Database query functions
//!
//! # Query Patterns
//! - Write functions take `&mut SqliteConnection` so the importer can run
//!   them on an open transaction (`&mut *tx`)
//! - Read helpers take the pool
//! - Get-or-create is always "insert, ignore on conflict, then select",
//!   relying on the UNIQUE constraint rather than a prior lookup

use crate::error::{Result, SyncError};
use crate::storage::models::*;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// Normalized natural key for a reference name
///
/// Trims, collapses inner whitespace and lowercases, so "  Acme  Press" and
/// "acme press" resolve to the same row.
pub fn normalized_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// Look up a book id by ISBN
pub async fn find_book_id_by_isbn(conn: &mut SqliteConnection, isbn: &str) -> Result<Option<i64>> {
    let id: Option<i64> = sqlx::query_scalar("SELECT book_id FROM books WHERE isbn = ?")
        .bind(isbn)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert a new book
///
/// Returns the book_id of the inserted book. The shelf is assigned separately
/// once categories are known.
pub async fn insert_book(conn: &mut SqliteConnection, book: &NewBook) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO books (
            isbn, title, subtitle, description, publish_year,
            language, cover_url, source_id, identifier_type,
            publisher_id, total_copies, available_copies
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0)
        "#,
    )
    .bind(&book.isbn)
    .bind(&book.title)
    .bind(&book.subtitle)
    .bind(&book.description)
    .bind(book.publish_year)
    .bind(&book.language)
    .bind(&book.cover_url)
    .bind(&book.source_id)
    .bind(&book.identifier_type)
    .bind(book.publisher_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Point a book at its shelf
pub async fn assign_book_shelf(conn: &mut SqliteConnection, book_id: i64, shelf_id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE books SET shelf_id = ? WHERE book_id = ?")
        .bind(shelf_id)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() != 1 {
        return Err(SyncError::DatabaseError(format!(
            "shelf assignment matched {} rows for book {}",
            result.rows_affected(),
            book_id
        )));
    }

    Ok(())
}

/// Find book by ISBN
pub async fn find_book_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
        .bind(isbn)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Book data with its references resolved to names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookWithRelations {
    pub book: Book,
    pub publisher: Option<String>,
    pub shelf: Option<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
}

/// Load a book together with publisher, shelf, categories and authors
pub async fn find_book_with_relations(pool: &SqlitePool, isbn: &str) -> Result<Option<BookWithRelations>> {
    let Some(book) = find_book_by_isbn(pool, isbn).await? else {
        return Ok(None);
    };

    let publisher: Option<String> = match book.publisher_id {
        Some(id) => {
            sqlx::query_scalar("SELECT name FROM publishers WHERE publisher_id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let shelf: Option<String> = match book.shelf_id {
        Some(id) => {
            sqlx::query_scalar("SELECT code FROM shelves WHERE shelf_id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let categories = find_categories_by_book(pool, book.book_id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let authors = find_authors_by_book(pool, book.book_id)
        .await?
        .into_iter()
        .map(|a| a.name)
        .collect();

    Ok(Some(BookWithRelations {
        book,
        publisher,
        shelf,
        categories,
        authors,
    }))
}

// ============================================================================
// REFERENCE QUERIES (publishers, categories, authors)
// ============================================================================

/// Get-or-create a publisher, category or author by name
///
/// The row is keyed on `normalized_key(name)`; the spelling seen first is
/// kept as the display name. Calling this again with any spelling that
/// normalizes the same way returns the same id.
pub async fn resolve_or_create(conn: &mut SqliteConnection, kind: EntityKind, name: &str) -> Result<Resolved> {
    let display = name.trim();
    let key = normalized_key(display);
    if key.is_empty() {
        return Err(SyncError::validation(kind.as_str(), "name is empty"));
    }

    let insert = format!(
        "INSERT INTO {} (name, normalized_name) VALUES (?, ?) ON CONFLICT(normalized_name) DO NOTHING",
        kind.table()
    );
    let result = sqlx::query(&insert)
        .bind(display)
        .bind(&key)
        .execute(&mut *conn)
        .await?;

    let select = format!(
        "SELECT {} FROM {} WHERE normalized_name = ?",
        kind.id_column(),
        kind.table()
    );
    let id: i64 = sqlx::query_scalar(&select)
        .bind(&key)
        .fetch_one(&mut *conn)
        .await?;

    Ok(Resolved {
        id,
        created: result.rows_affected() == 1,
    })
}

/// Find a publisher, category or author by any spelling of its name
pub async fn find_reference_by_name(pool: &SqlitePool, kind: EntityKind, name: &str) -> Result<Option<NamedEntity>> {
    let sql = format!(
        "SELECT {} AS id, name, normalized_name FROM {} WHERE normalized_name = ?",
        kind.id_column(),
        kind.table()
    );
    let entity = sqlx::query_as::<_, NamedEntity>(&sql)
        .bind(normalized_key(name))
        .fetch_optional(pool)
        .await?;

    Ok(entity)
}

/// Link book to category
///
/// Returns `false` when the link already existed.
pub async fn link_book_category(conn: &mut SqliteConnection, book_id: i64, category_id: i64) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO book_categories (book_id, category_id) VALUES (?, ?)")
        .bind(book_id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Link book to author
///
/// Returns `false` when the link already existed.
pub async fn link_book_author(conn: &mut SqliteConnection, book_id: i64, author_id: i64) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO book_authors (book_id, author_id) VALUES (?, ?)")
        .bind(book_id)
        .bind(author_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Categories linked to a book, in link order
pub async fn find_categories_by_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<NamedEntity>> {
    let categories = sqlx::query_as::<_, NamedEntity>(
        r#"
        SELECT c.category_id AS id, c.name, c.normalized_name FROM categories c
        INNER JOIN book_categories bc ON c.category_id = bc.category_id
        WHERE bc.book_id = ?
        ORDER BY bc.rowid
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Authors linked to a book, in link order
pub async fn find_authors_by_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<NamedEntity>> {
    let authors = sqlx::query_as::<_, NamedEntity>(
        r#"
        SELECT a.author_id AS id, a.name, a.normalized_name FROM authors a
        INNER JOIN book_authors ba ON a.author_id = ba.author_id
        WHERE ba.book_id = ?
        ORDER BY ba.rowid
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(authors)
}

// ============================================================================
// SHELF QUERIES
// ============================================================================

/// Get-or-create a shelf by code
pub async fn resolve_or_create_shelf(conn: &mut SqliteConnection, code: &str) -> Result<Resolved> {
    let code = code.trim();
    if code.is_empty() {
        return Err(SyncError::validation("shelf", "code is empty"));
    }

    let result = sqlx::query("INSERT INTO shelves (code) VALUES (?) ON CONFLICT(code) DO NOTHING")
        .bind(code)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT shelf_id FROM shelves WHERE code = ?")
        .bind(code)
        .fetch_one(&mut *conn)
        .await?;

    Ok(Resolved {
        id,
        created: result.rows_affected() == 1,
    })
}

/// Find shelf by code
pub async fn find_shelf_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Shelf>> {
    let shelf = sqlx::query_as::<_, Shelf>("SELECT * FROM shelves WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await?;

    Ok(shelf)
}
