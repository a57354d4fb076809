//! Book model and provider metadata

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel for metadata fields the provider did not supply
const UNKNOWN: &str = "Unknown";

/// Catalog entry. `quantity` is the on-hand copy counter and is never
/// negative; `isbn` is unique across the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    /// Numeric identity key
    pub isbn: i64,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: Option<i32>,
    pub genre: String,
    /// Cover image reference
    pub cover_url: Option<String>,
    /// On-hand copies, >= 0
    pub quantity: i32,
}

/// Bibliographic record returned by the external metadata provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub thumbnail: Option<String>,
}

impl Book {
    /// Build a catalog entry from a provider record, defaulting missing
    /// fields to "Unknown" and parsing the publication year when present.
    pub fn from_metadata(isbn: i64, quantity: i32, meta: BookMetadata) -> Self {
        let author = if meta.authors.is_empty() {
            UNKNOWN.to_string()
        } else {
            meta.authors.join(", ")
        };
        let genre = if meta.categories.is_empty() {
            UNKNOWN.to_string()
        } else {
            meta.categories.join(", ")
        };
        // Published dates come back as "2019", "2019-04" or "2019-04-01"
        let year = meta
            .published_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok());

        Self {
            isbn,
            title: meta.title.unwrap_or_else(|| UNKNOWN.to_string()),
            author,
            publisher: meta.publisher.unwrap_or_else(|| UNKNOWN.to_string()),
            year,
            genre,
            cover_url: meta.thumbnail,
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metadata_fields_default_to_unknown() {
        let book = Book::from_metadata(111, 3, BookMetadata::default());
        assert_eq!(book.title, "Unknown");
        assert_eq!(book.author, "Unknown");
        assert_eq!(book.publisher, "Unknown");
        assert_eq!(book.genre, "Unknown");
        assert_eq!(book.year, None);
        assert_eq!(book.cover_url, None);
        assert_eq!(book.quantity, 3);
    }

    #[test]
    fn authors_and_categories_join_with_commas() {
        let meta = BookMetadata {
            title: Some("Dune".to_string()),
            authors: vec!["Frank Herbert".to_string(), "Brian Herbert".to_string()],
            categories: vec!["Fiction".to_string(), "Science Fiction".to_string()],
            published_date: Some("1965-08-01".to_string()),
            publisher: Some("Chilton Books".to_string()),
            thumbnail: Some("http://books.example/dune.jpg".to_string()),
        };
        let book = Book::from_metadata(9780441013593, 2, meta);
        assert_eq!(book.author, "Frank Herbert, Brian Herbert");
        assert_eq!(book.genre, "Fiction, Science Fiction");
        assert_eq!(book.year, Some(1965));
    }
}
