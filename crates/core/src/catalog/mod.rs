//! Catalog repository: the document collection of book records.
//!
//! The catalog is an external collaborator from the point of view of ingestion and deletion;
//! they only see the [`CatalogRepository`] trait. Two implementations ship with the crate:
//!
//! - [`FileCatalog`]: one JSON document per record in a sharded directory tree
//! - [`MemoryCatalog`]: an in-process map, used by tests and throwaway runs
//!
//! ## Uniqueness
//!
//! No two records may share a (title, author) pair under case-insensitive comparison.
//! Implementations must make [`CatalogRepository::insert`] a conditional write: the check and
//! the write happen atomically with respect to other inserts on the same instance, and a
//! conflict yields [`BookError::DuplicateEntry`].

mod file;
mod memory;

pub use file::FileCatalog;
pub use memory::MemoryCatalog;

use crate::{BookError, BookResult};
use bibliotek_types::{fold_case, NonEmptyText};
use bibliotek_uuid::CanonicalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted catalog entry.
///
/// Field names on the wire match the document layout the reading client expects
/// (`_id`, `pdfUrl`, `imageUrl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    #[serde(rename = "_id")]
    pub id: CanonicalId,
    pub title: NonEmptyText,
    pub author: NonEmptyText,
    pub category: String,
    pub year: i32,
    pub description: String,
    /// Stored name of the primary document; empty for metadata-only entries.
    #[serde(default)]
    pub pdf_url: String,
    /// Stored name of the cover image, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookRecord {
    /// True if this record has the given title and author, ignoring case.
    pub fn has_title_and_author(&self, title: &str, author: &str) -> bool {
        self.title.eq_ignore_case(title) && self.author.eq_ignore_case(author)
    }

    /// True if `query` occurs in the title, author or category, ignoring case.
    ///
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = fold_case(query);
        if needle.is_empty() {
            return true;
        }

        [
            self.title.as_str(),
            self.author.as_str(),
            self.category.as_str(),
        ]
        .iter()
        .any(|field| fold_case(field).contains(&needle))
    }

    /// Stored names of every blob this record references.
    pub fn blob_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(2);
        if !self.pdf_url.is_empty() {
            names.push(self.pdf_url.as_str());
        }
        if let Some(image) = self.image_url.as_deref().filter(|s| !s.is_empty()) {
            names.push(image);
        }
        names
    }
}

/// A record before the catalog has assigned its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: NonEmptyText,
    pub author: NonEmptyText,
    pub category: String,
    pub year: i32,
    pub description: String,
    pub pdf_url: String,
    pub image_url: Option<String>,
}

impl NewBook {
    /// Attach the identity and creation time chosen by the catalog.
    pub fn into_record(self, id: CanonicalId, created_at: DateTime<Utc>) -> BookRecord {
        BookRecord {
            id,
            title: self.title,
            author: self.author,
            category: self.category,
            year: self.year,
            description: self.description,
            pdf_url: self.pdf_url,
            image_url: self.image_url,
            created_at,
        }
    }

    pub(crate) fn duplicate_error(&self) -> BookError {
        BookError::DuplicateEntry {
            title: self.title.to_string(),
            author: self.author.to_string(),
        }
    }
}

/// Storage-agnostic access to book records.
///
/// Ids are passed as plain strings because they arrive from request paths; implementations
/// treat anything that is not a canonical id as unknown.
pub trait CatalogRepository: Send + Sync {
    /// All records, oldest first.
    fn find_all(&self) -> BookResult<Vec<BookRecord>>;

    fn find_by_id(&self, id: &str) -> BookResult<Option<BookRecord>>;

    /// Case-insensitive existence check on (title, author).
    fn exists_by_title_and_author(&self, title: &str, author: &str) -> BookResult<bool> {
        Ok(self
            .find_all()?
            .iter()
            .any(|book| book.has_title_and_author(title, author)))
    }

    /// Case-insensitive substring search over title, author and category.
    fn search(&self, query: &str) -> BookResult<Vec<BookRecord>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|book| book.matches_query(query))
            .collect())
    }

    /// Persists `book`, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::DuplicateEntry`] if a record with the same (title, author) already
    /// exists, or a catalog I/O error if the write fails.
    fn insert(&self, book: NewBook) -> BookResult<BookRecord>;

    /// Removes a record; returns whether one was removed.
    fn delete_by_id(&self, id: &str) -> BookResult<bool>;
}

/// Sorts records oldest first, breaking ties by id.
pub(crate) fn sort_records(records: &mut [BookRecord]) {
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
    });
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: NonEmptyText::new(title).unwrap(),
            author: NonEmptyText::new(author).unwrap(),
            category: "Fiction".into(),
            year: 1605,
            description: "A novel".into(),
            pdf_url: String::new(),
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::new_book;
    use super::*;

    fn record(title: &str, author: &str, category: &str) -> BookRecord {
        let mut book = new_book(title, author);
        book.category = category.into();
        book.into_record(CanonicalId::new(), Utc::now())
    }

    #[test]
    fn test_has_title_and_author_ignores_case() {
        let book = record("Don Quijote", "Cervantes", "Fiction");
        assert!(book.has_title_and_author("DON QUIJOTE", "cervantes"));
        assert!(!book.has_title_and_author("Don Quijote", "Lope de Vega"));
    }

    #[test]
    fn test_matches_query_over_title_author_category() {
        let book = record("Cien años de soledad", "García Márquez", "Realismo mágico");
        assert!(book.matches_query("SOLEDAD"));
        assert!(book.matches_query("márquez"));
        assert!(book.matches_query("mágico"));
        assert!(book.matches_query(""));
        assert!(!book.matches_query("quijote"));
    }

    #[test]
    fn test_blob_names() {
        let mut book = record("A", "B", "C");
        assert!(book.blob_names().is_empty());

        book.pdf_url = "t_a.pdf".into();
        book.image_url = Some("t_a.png".into());
        assert_eq!(book.blob_names(), vec!["t_a.pdf", "t_a.png"]);
    }

    #[test]
    fn test_record_json_field_names() {
        let mut book = record("Don Quijote", "Cervantes", "Fiction");
        book.pdf_url = "tok_fileA".into();

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["_id"], book.id.to_string());
        assert_eq!(json["pdfUrl"], "tok_fileA");
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("createdAt").is_some());

        let back: BookRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
