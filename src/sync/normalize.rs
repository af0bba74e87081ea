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


//! Cleanup rules applied to record fields before they reach the database

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PUBLISHER_SUFFIX: Regex =
        Regex::new(r"(?i),?\s*(Inc\.|Ltd\.|LLC|Corporation)\.?$").expect("valid publisher suffix pattern");
    static ref CATEGORY_SUFFIX: Regex =
        Regex::new(r"\s*&\s*(Literature|Fiction)$").expect("valid category suffix pattern");
}

/// Values upstream uses to mean "no value"
const PLACEHOLDERS: &[&str] = &["n/a", "unknown"];

/// True for empty strings and upstream placeholders such as "N/A"
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.iter().any(|p| value.eq_ignore_ascii_case(p))
}

/// Publisher display name with corporate suffixes removed
///
/// "O'Reilly Media, Inc." -> "O'Reilly Media"
pub fn publisher_name(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    let cleaned = PUBLISHER_SUFFIX.replace(raw.trim(), "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Category display name
///
/// Keeps the most specific segment of a path-like category and drops a
/// trailing "& Literature" / "& Fiction":
/// "Computers / Programming" -> "Programming",
/// "Fiction & Literature" -> "Fiction".
pub fn category_name(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        return None;
    }
    let last = raw.rsplit('/').next().unwrap_or(raw).trim();
    let cleaned = CATEGORY_SUFFIX.replace(last, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty() && !is_placeholder(cleaned)).then(|| cleaned.to_string())
}

/// Author display name
pub fn author_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!is_placeholder(trimmed)).then(|| trimmed.to_string())
}

/// Split a "Nam Cao, To Hoai" style author string
pub fn split_authors(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Full language name for a language code
pub fn language_name(code: &str) -> Option<String> {
    let code = code.trim();
    if is_placeholder(code) {
        return None;
    }
    let name = match code.to_ascii_lowercase().as_str() {
        "en" => "English".to_string(),
        "vi" => "Vietnamese".to_string(),
        _ => code.to_uppercase(),
    };
    Some(name)
}

/// Optional text field: trimmed, placeholders become `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !is_placeholder(v))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("  N/A "));
        assert!(is_placeholder("Unknown"));
        assert!(!is_placeholder("Penguin"));
    }

    #[test]
    fn test_publisher_name() {
        assert_eq!(publisher_name("O'Reilly Media, Inc.").as_deref(), Some("O'Reilly Media"));
        assert_eq!(publisher_name("Penguin Random House LLC").as_deref(), Some("Penguin Random House"));
        assert_eq!(publisher_name("Acme Corporation").as_deref(), Some("Acme"));
        assert_eq!(publisher_name("Packt Publishing Ltd.").as_deref(), Some("Packt Publishing"));
        assert_eq!(publisher_name("Apress").as_deref(), Some("Apress"));
        assert_eq!(publisher_name("Unknown"), None);
        assert_eq!(publisher_name("   "), None);
    }

    #[test]
    fn test_category_name() {
        assert_eq!(category_name("Computers / Programming").as_deref(), Some("Programming"));
        assert_eq!(category_name("Fiction & Literature").as_deref(), Some("Fiction"));
        assert_eq!(category_name("Science Fiction & Fantasy").as_deref(), Some("Science Fiction & Fantasy"));
        assert_eq!(category_name("History").as_deref(), Some("History"));
        assert_eq!(category_name("N/A"), None);
        assert_eq!(category_name("Computers /"), None);
    }

    #[test]
    fn test_authors() {
        assert_eq!(split_authors("Nam Cao, To Hoai,"), vec!["Nam Cao", "To Hoai"]);
        assert_eq!(author_name("  X "), Some("X".to_string()));
        assert_eq!(author_name("Unknown"), None);
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("en").as_deref(), Some("English"));
        assert_eq!(language_name("vi").as_deref(), Some("Vietnamese"));
        assert_eq!(language_name("fr").as_deref(), Some("FR"));
        assert_eq!(language_name(""), None);
    }
}
