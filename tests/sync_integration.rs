//! Integration tests for directory sync
//!
//! Each test writes processed JSON files into a temp directory and syncs
//! them into a fresh database.

use catalog_sync::config::SyncConfig;
use catalog_sync::error::{FailureKind, SyncError};
use catalog_sync::storage::{queries, Database, TableCounts};
use catalog_sync::sync::LibrarySync;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap())
        .expect("Failed to write fixture");
}

fn input_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

async fn memory_db() -> Database {
    Database::new_in_memory().await.expect("Failed to create database")
}

#[tokio::test]
async fn test_same_record_twice() {
    let dir = input_dir();
    let record = json!({
        "isbn": "123",
        "title": "A",
        "publisher": "Acme",
        "categories": ["Fiction"],
        "authors": ["X"]
    });
    write_json(dir.path(), "books_1.json", record.clone());
    write_json(dir.path(), "books_2.json", record);

    let db = memory_db().await;
    let mut sync = LibrarySync::new(&db, &SyncConfig::default());
    let summary = sync.sync_directory(dir.path()).await.expect("Sync aborted");

    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped_duplicate, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.publishers_created, 1);
    assert_eq!(summary.categories_created, 1);
    assert_eq!(summary.authors_created, 1);

    assert_eq!(
        db.counts().await.unwrap(),
        TableCounts {
            books: 1,
            publishers: 1,
            categories: 1,
            authors: 1,
            shelves: 1,
            book_categories: 1,
            book_authors: 1,
        }
    );
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "clean_books_1.json",
        json!([
            {"isbn": "9780262033848", "title": "Introduction to Algorithms",
             "publisher": "MIT Press", "categories": ["Computers / Programming"],
             "authors": "Thomas H. Cormen, Charles E. Leiserson"},
            {"isbn": "9780143127741", "title": "The Sympathizer",
             "publisher": "Grove Press", "categories": ["Fiction & Literature", "History"],
             "authors": ["Viet Thanh Nguyen"]},
            {"isbn": "9781491950296", "title": "Programming Rust",
             "publisher": "O'Reilly Media, Inc.", "categories": ["Programming"],
             "authors": ["Jim Blandy", "Jason Orendorff"]}
        ]),
    );

    let db = memory_db().await;
    let config = SyncConfig::default();

    let first = LibrarySync::new(&db, &config)
        .sync_directory(dir.path())
        .await
        .expect("First sync aborted");
    let after_first = db.counts().await.unwrap();

    // a fresh driver starts with an empty cache and must still resolve existing rows
    let second = LibrarySync::new(&db, &config)
        .sync_directory(dir.path())
        .await
        .expect("Second sync aborted");
    let after_second = db.counts().await.unwrap();

    assert_eq!(first.inserted, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 3);
    assert_eq!(second.publishers_created, 0);
    assert_eq!(after_first, after_second);

    assert_eq!(after_first.books, 3);
    assert_eq!(after_first.publishers, 3);
    // Programming, Fiction, History
    assert_eq!(after_first.categories, 3);
    assert_eq!(after_first.authors, 5);
    assert_eq!(after_first.book_categories, 4);
    assert!(db.check_integrity().await.unwrap());
}

#[tokio::test]
async fn test_record_contents_are_normalized() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "book.json",
        json!({
            "id": "zyTCAlFPjgYC",
            "identifier": "9781491950296",
            "type": "ISBN_13",
            "title": "Programming Rust",
            "subtitle": "N/A",
            "publisher": "O'Reilly Media, Inc.",
            "category": "Computers / Programming",
            "authors": "Jim Blandy, Jason Orendorff, Unknown",
            "published_year": "2017",
            "language": "en",
            "cover_url": "http://books.example/rust.jpg"
        }),
    );

    let db = memory_db().await;
    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");
    assert_eq!(summary.inserted, 1);

    let loaded = queries::find_book_with_relations(db.pool(), "9781491950296")
        .await
        .unwrap()
        .expect("Book not stored");

    assert_eq!(loaded.book.title, "Programming Rust");
    assert_eq!(loaded.book.subtitle, None);
    assert_eq!(loaded.book.publish_year, Some(2017));
    assert_eq!(loaded.book.language.as_deref(), Some("English"));
    assert_eq!(loaded.book.source_id.as_deref(), Some("zyTCAlFPjgYC"));
    assert_eq!(loaded.book.identifier_type.as_deref(), Some("ISBN_13"));
    assert_eq!(loaded.book.cover_url.as_deref(), Some("http://books.example/rust.jpg"));
    assert_eq!(loaded.publisher.as_deref(), Some("O'Reilly Media"));
    assert_eq!(loaded.categories, vec!["Programming"]);
    assert_eq!(loaded.authors, vec!["Jim Blandy", "Jason Orendorff"]);
    assert_eq!(loaded.shelf.as_deref(), Some("1A-01"));
}

#[tokio::test]
async fn test_record_with_both_key_spellings() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "books.json",
        json!([
            {"isbn": "9780143127741", "identifier": "9780143127741", "title": "The Sympathizer",
             "thumbnail": "http://books.example/small.jpg", "cover_url": "http://books.example/large.jpg"},
            {"isbn": "", "identifier": 9780262033848u64, "title": "Introduction to Algorithms",
             "thumbnail": "N/A", "cover_url": "http://books.example/clrs.jpg"},
            {"isbn": 9.780262033848e12, "title": "Float ISBN"}
        ]),
    );

    let db = memory_db().await;
    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].source, "books.json[2]");
    assert_eq!(summary.failures[0].kind, FailureKind::Validation);

    let first = queries::find_book_by_isbn(db.pool(), "9780143127741")
        .await
        .unwrap()
        .expect("Book with both isbn keys not stored");
    assert_eq!(first.cover_url.as_deref(), Some("http://books.example/small.jpg"));

    let second = queries::find_book_by_isbn(db.pool(), "9780262033848")
        .await
        .unwrap()
        .expect("Book with identifier fallback not stored");
    assert_eq!(second.cover_url.as_deref(), Some("http://books.example/clrs.jpg"));
}

#[tokio::test]
async fn test_invalid_records_write_nothing() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "books.json",
        json!([
            {"title": "No ISBN", "publisher": "Ghost Press", "authors": ["Nobody"]},
            {"isbn": "777", "title": "   ", "categories": ["Phantom"]},
            {"isbn": "888", "title": "Valid", "authors": ["Somebody"]}
        ]),
    );

    let db = memory_db().await;
    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.failed, 2);
    assert!(summary.failures.iter().all(|f| f.kind == FailureKind::Validation));
    assert_eq!(summary.failures[0].source, "books.json[0]");
    assert_eq!(summary.failures[0].isbn, None);
    assert_eq!(summary.failures[1].isbn.as_deref(), Some("777"));

    let counts = db.counts().await.unwrap();
    assert_eq!(counts.books, 1);
    assert_eq!(counts.publishers, 0);
    assert_eq!(counts.categories, 0);
    assert_eq!(counts.authors, 1);
}

#[tokio::test]
async fn test_malformed_file_does_not_stop_the_run() {
    let dir = input_dir();
    std::fs::write(dir.path().join("a_broken.json"), "[{\"isbn\": \"1\",").unwrap();
    std::fs::write(dir.path().join("b_scalar.json"), "\"just a string\"").unwrap();
    write_json(dir.path(), "c_good.json", json!({"isbn": "1", "title": "Good"}));

    let db = memory_db().await;
    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    assert_eq!(summary.files_processed, 3);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.failed, 2);
    assert!(summary.failures.iter().all(|f| f.kind == FailureKind::Parse));
    assert_eq!(db.counts().await.unwrap().books, 1);
}

#[tokio::test]
async fn test_storage_failure_rolls_back_one_record() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "books.json",
        json!([
            {"isbn": "1", "title": "Doomed", "publisher": "Shared Press",
             "categories": ["History"], "authors": ["Reject Me"]},
            {"isbn": "2", "title": "Survivor", "publisher": "Shared Press",
             "categories": ["History"], "authors": ["Accept Me"]}
        ]),
    );

    let db = memory_db().await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_author BEFORE INSERT ON authors
        WHEN NEW.name = 'Reject Me'
        BEGIN
            SELECT RAISE(ABORT, 'author rejected');
        END
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();

    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].kind, FailureKind::Storage);
    assert_eq!(summary.failures[0].isbn.as_deref(), Some("1"));
    // created by the surviving record, not the rolled back one
    assert_eq!(summary.publishers_created, 1);

    assert!(queries::find_book_by_isbn(db.pool(), "1").await.unwrap().is_none());
    let survivor = queries::find_book_with_relations(db.pool(), "2")
        .await
        .unwrap()
        .expect("Second record not stored");
    assert_eq!(survivor.publisher.as_deref(), Some("Shared Press"));
    assert_eq!(survivor.shelf.as_deref(), Some("1B-01"));

    let counts = db.counts().await.unwrap();
    assert_eq!(counts.books, 1);
    assert_eq!(counts.publishers, 1);
    assert_eq!(counts.categories, 1);
    assert_eq!(counts.authors, 1);
}

#[tokio::test]
async fn test_same_category_same_shelf() {
    let dir = input_dir();
    write_json(
        dir.path(),
        "books.json",
        json!([
            {"isbn": "1", "title": "One", "categories": ["Fiction"]},
            {"isbn": "2", "title": "Two", "categories": ["FICTION", "History"]},
            {"isbn": "3", "title": "Three", "categories": ["Fiction & Literature"]},
            {"isbn": "4", "title": "Four", "categories": []}
        ]),
    );

    let db = memory_db().await;
    LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    let mut shelves = Vec::new();
    for isbn in ["1", "2", "3", "4"] {
        let book = queries::find_book_with_relations(db.pool(), isbn)
            .await
            .unwrap()
            .expect("Book not stored");
        shelves.push(book.shelf.unwrap_or_default());
    }

    assert_eq!(shelves, vec!["1C-02", "1C-02", "1C-02", "1A-01"]);
    assert_eq!(db.counts().await.unwrap().shelves, 2);
}

#[tokio::test]
async fn test_configured_shelves_and_prefix() {
    let dir = input_dir();
    write_json(dir.path(), "clean_books_1.json", json!({"isbn": "1", "title": "Poems", "categories": ["Poetry"]}));
    write_json(dir.path(), "raw_books_1.json", json!({"isbn": "2", "title": "Raw"}));

    let config = SyncConfig::from_toml_str(
        r#"
        file_prefix = "clean_books_"

        [shelves]
        default = "9Z-99"

        [shelves.categories]
        "poetry" = "2P-01"
        "#,
    )
    .expect("Failed to parse config");

    let db = memory_db().await;
    let summary = LibrarySync::new(&db, &config)
        .sync_directory(dir.path())
        .await
        .expect("Sync aborted");

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.inserted, 1);
    assert!(queries::find_book_by_isbn(db.pool(), "2").await.unwrap().is_none());
    assert!(queries::find_shelf_by_code(db.pool(), "2P-01").await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_input_directory() {
    let dir = input_dir();
    let db = memory_db().await;

    let err = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(&dir.path().join("missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidPath(_)));
    assert_eq!(db.counts().await.unwrap(), TableCounts::default());
}

#[tokio::test]
async fn test_file_backed_database_persists() {
    let dir = input_dir();
    let data = dir.path().join("processed");
    std::fs::create_dir(&data).unwrap();
    write_json(&data, "books.json", json!([{"isbn": "1", "title": "Kept", "publisher": "Acme"}]));

    let db_path = dir.path().join("db").join("library.db");
    {
        let db = Database::new(&db_path).await.expect("Failed to open database");
        let summary = LibrarySync::new(&db, &SyncConfig::default())
            .sync_directory(&data)
            .await
            .expect("Sync aborted");
        assert_eq!(summary.inserted, 1);
        db.close().await.unwrap();
    }

    let db = Database::new(&db_path).await.expect("Failed to reopen database");
    let summary = LibrarySync::new(&db, &SyncConfig::default())
        .sync_directory(&data)
        .await
        .expect("Sync aborted");

    assert_eq!(summary.skipped_duplicate, 1);
    let counts = db.counts().await.unwrap();
    assert_eq!(counts.books, 1);
    assert_eq!(counts.publishers, 1);
}
