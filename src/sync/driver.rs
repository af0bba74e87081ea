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


//! Sync driver
//!
//! Walks a directory of processed JSON files and feeds every record to the
//! [`BookImporter`], one after another. Per-record and per-file problems are
//! collected in the [`SyncSummary`]; only a missing input directory stops
//! the run.

use crate::config::SyncConfig;
use crate::error::{FailureKind, Result, SyncError};
use crate::storage::Database;
use crate::sync::importer::{BookImporter, InsertOutcome};
use crate::sync::record::{parse_document, BookRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

// ============================================================================
// SUMMARY
// ============================================================================

/// One record or file that could not be synced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    /// File name, with `[index]` for records inside an array document
    pub source: String,
    /// ISBN of the record when it could be read
    pub isbn: Option<String>,
    pub kind: FailureKind,
    pub reason: String,
}

/// Sync run statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Files opened (including ones that failed to parse)
    pub files_processed: usize,
    /// Books newly inserted
    pub inserted: usize,
    /// Records skipped because the ISBN already existed
    pub skipped_duplicate: usize,
    /// Records (or whole files) that failed
    pub failed: usize,
    pub publishers_created: usize,
    pub categories_created: usize,
    pub authors_created: usize,
    pub shelves_created: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (and unreadable files) handled in this run
    pub fn total(&self) -> usize {
        self.inserted + self.skipped_duplicate + self.failed
    }

    fn push_failure(&mut self, source: String, isbn: Option<String>, kind: FailureKind, reason: String) {
        self.failed += 1;
        self.failures.push(SyncFailure {
            source,
            isbn,
            kind,
            reason,
        });
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "CATALOG SYNC SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Files processed:     {}", self.files_processed)?;
        writeln!(f, "Books inserted:      {}", self.inserted)?;
        writeln!(f, "Books skipped:       {}", self.skipped_duplicate)?;
        writeln!(f, "Records failed:      {}", self.failed)?;
        writeln!(f, "Publishers created:  {}", self.publishers_created)?;
        writeln!(f, "Categories created:  {}", self.categories_created)?;
        writeln!(f, "Authors created:     {}", self.authors_created)?;
        writeln!(f, "Shelves created:     {}", self.shelves_created)?;
        if !self.failures.is_empty() {
            writeln!(f, "{}", "-".repeat(60))?;
            for failure in &self.failures {
                match &failure.isbn {
                    Some(isbn) => writeln!(
                        f,
                        "[{}] {} (ISBN {}): {}",
                        failure.kind, failure.source, isbn, failure.reason
                    )?,
                    None => writeln!(f, "[{}] {}: {}", failure.kind, failure.source, failure.reason)?,
                }
            }
        }
        write!(f, "{}", rule)
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Sequential directory-to-database sync
pub struct LibrarySync {
    importer: BookImporter,
    file_prefix: Option<String>,
    progress_interval: usize,
    records_seen: usize,
}

impl LibrarySync {
    pub fn new(db: &Database, config: &SyncConfig) -> Self {
        Self {
            importer: BookImporter::new(db.pool().clone(), config.shelves.clone()),
            file_prefix: config.file_prefix.clone(),
            progress_interval: config.progress_interval.max(1),
            records_seen: 0,
        }
    }

    /// Sync every matching JSON file in `directory`
    ///
    /// # Errors
    /// Only if the directory is missing or unreadable; everything after that
    /// is reported through the summary.
    pub async fn sync_directory(&mut self, directory: &Path) -> Result<SyncSummary> {
        let sources = self.list_sources(directory).await?;

        if sources.is_empty() {
            warn!("No processed files found in {}", directory.display());
        } else {
            info!("Found {} processed file(s)", sources.len());
        }

        Ok(self.sync_sources(&sources).await)
    }

    /// JSON files in `directory` matching the configured prefix, sorted by name
    pub async fn list_sources(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let is_dir = fs::metadata(directory)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(SyncError::InvalidPath(format!(
                "Input directory does not exist: {}",
                directory.display()
            )));
        }

        let mut entries = fs::read_dir(directory).await.map_err(|e| {
            SyncError::InvalidPath(format!("Failed to read directory {}: {}", directory.display(), e))
        })?;

        let mut sources = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            SyncError::InvalidPath(format!(
                "Failed to read directory entry in {}: {}",
                directory.display(),
                e
            ))
        })? {
            let path = entry.path();
            if !self.matches(&path) {
                continue;
            }
            // follows symlinks; entries that vanish mid-listing are skipped
            let is_file = fs::metadata(&path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if is_file {
                sources.push(path);
            }
        }

        sources.sort();
        Ok(sources)
    }

    fn matches(&self, path: &Path) -> bool {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let prefix_ok = match (&self.file_prefix, path.file_name().and_then(|n| n.to_str())) {
            (Some(prefix), Some(name)) => name.starts_with(prefix.as_str()),
            (Some(_), None) => false,
            (None, _) => true,
        };

        is_json && prefix_ok
    }

    /// Sync an explicit list of files, in the given order
    pub async fn sync_sources(&mut self, sources: &[PathBuf]) -> SyncSummary {
        let mut summary = SyncSummary::new();
        let created_before = self.importer.cache().created();

        for path in sources {
            self.sync_file(path, &mut summary).await;
        }

        let created = self.importer.cache().created().since(&created_before);
        summary.publishers_created = created.publishers;
        summary.categories_created = created.categories;
        summary.authors_created = created.authors;
        summary.shelves_created = created.shelves;

        info!(
            inserted = summary.inserted,
            skipped = summary.skipped_duplicate,
            failed = summary.failed,
            "Total: {} records processed",
            summary.total()
        );

        summary
    }

    async fn sync_file(&mut self, path: &Path, summary: &mut SyncSummary) {
        summary.files_processed += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Processing: {}", file_name);

        let records = match self.read_records(path).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping file {}: {}", file_name, e);
                summary.push_failure(file_name, None, e.kind(), e.user_message());
                return;
            }
        };

        info!("  Found {} books", records.len());
        let single = records.len() == 1;

        for (index, record) in records.into_iter().enumerate() {
            let source = if single {
                file_name.clone()
            } else {
                format!("{}[{}]", file_name, index)
            };

            match record {
                Ok(record) => self.sync_record(source, &record, summary).await,
                Err(e) => {
                    warn!("Malformed record {}: {}", source, e);
                    summary.push_failure(source, None, FailureKind::Validation, e.to_string());
                }
            }

            self.records_seen += 1;
            if self.records_seen % self.progress_interval == 0 {
                info!("  Progress: {} books...", self.records_seen);
            }
        }
    }

    async fn read_records(&self, path: &Path) -> Result<Vec<serde_json::Result<BookRecord>>> {
        let text = fs::read_to_string(path).await.map_err(|e| {
            SyncError::FileIoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        parse_document(&text)
    }

    async fn sync_record(&mut self, source: String, record: &BookRecord, summary: &mut SyncSummary) {
        match self.importer.insert_book(record).await {
            Ok(InsertOutcome::Inserted { .. }) => summary.inserted += 1,
            Ok(InsertOutcome::Skipped(_)) => summary.skipped_duplicate += 1,
            Err(e) => {
                let isbn = record.isbn_hint();
                warn!(
                    source = %source,
                    isbn = isbn.as_deref().unwrap_or("-"),
                    kind = %e.kind(),
                    "Failed to insert book: {}",
                    e
                );
                summary.push_failure(source, isbn, e.kind(), e.user_message());
            }
        }
    }
}
