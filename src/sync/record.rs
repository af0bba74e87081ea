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


//! Processed book records as read from JSON
//!
//! A document is either one record object or an array of them. Field
//! handling is lenient about shape (numbers for ISBNs, a comma-joined author
//! string, a single `category`) because the upstream processor has emitted
//! all of these; whether the record is *complete* is checked later by the
//! importer.

use crate::error::{Result, SyncError};
use crate::storage::queries::normalized_key;
use crate::sync::normalize;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;

/// One processed book record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    /// Processor spelling of the ISBN; used when `isbn` is absent or blank
    #[serde(default, deserialize_with = "string_or_number")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub categories: Vec<String>,
    /// Single-category form used by older processor output
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "comma_separated")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Id assigned by the upstream catalog
    #[serde(default, rename = "id", deserialize_with = "string_or_number")]
    pub source_id: Option<String>,
    /// Identifier flavour, e.g. ISBN_13
    #[serde(default, rename = "type")]
    pub identifier_type: Option<String>,
}

impl BookRecord {
    /// Convenience constructor for the required fields
    pub fn new<I: Into<String>, T: Into<String>>(isbn: I, title: T) -> Self {
        Self {
            isbn: Some(isbn.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Publisher name after cleanup, if any
    pub fn publisher_name(&self) -> Option<String> {
        self.publisher.as_deref().and_then(normalize::publisher_name)
    }

    /// Category names after cleanup, first occurrence order, one per
    /// normalized name. The first entry is the primary category.
    pub fn category_names(&self) -> Vec<String> {
        let names = self
            .categories
            .iter()
            .chain(self.category.iter())
            .filter_map(|c| normalize::category_name(c));
        distinct_by_key(names)
    }

    /// Author names after cleanup, first occurrence order, one per
    /// normalized name
    pub fn author_names(&self) -> Vec<String> {
        distinct_by_key(self.authors.iter().filter_map(|a| normalize::author_name(a)))
    }

    /// ISBN from `isbn`, falling back to `identifier`
    pub fn isbn_value(&self) -> Option<&str> {
        [&self.isbn, &self.identifier]
            .into_iter()
            .filter_map(|v| v.as_deref().map(str::trim))
            .find(|v| !v.is_empty())
    }

    /// Cover image URL from `thumbnail`, falling back to `cover_url`
    pub fn cover_value(&self) -> Option<&str> {
        [&self.thumbnail, &self.cover_url]
            .into_iter()
            .filter_map(|v| v.as_deref().map(str::trim))
            .find(|v| !normalize::is_placeholder(v))
    }

    /// ISBN if present, for error reporting
    pub fn isbn_hint(&self) -> Option<String> {
        self.isbn_value().map(str::to_string)
    }
}

fn distinct_by_key(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.filter(|name| seen.insert(normalized_key(name))).collect()
}

/// Split a JSON document into its records
///
/// Each element is parsed independently so one malformed record in an array
/// does not take the rest of the file with it.
pub fn parse_document(text: &str) -> Result<Vec<serde_json::Result<BookRecord>>> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(items) => Ok(items.into_iter().map(serde_json::from_value).collect()),
        Value::Object(_) => Ok(vec![serde_json::from_value(value)]),
        other => Err(SyncError::invalid_input(format!(
            "expected a record object or an array of records, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// FIELD DESERIALIZERS
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(StringOrNumber::Text(s)) => Ok(Some(s)),
        Some(StringOrNumber::Number(n)) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => Ok(Some(u.to_string())),
            (None, Some(i)) => Ok(Some(i.to_string())),
            (None, None) => Err(D::Error::custom(format!(
                "expected an integer or string identifier, found {}",
                n
            ))),
        },
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<String>),
    One(String),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

fn comma_separated<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(joined)) => normalize::split_authors(&joined),
        None => Vec::new(),
    })
}

fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(s)) => {
            let s = s.trim();
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    })
}
