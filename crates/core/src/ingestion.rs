//! Ingestion: turning an upload into a persisted, storage-backed catalog record.
//!
//! ## Steps
//!
//! 1. Reject a (title, author) pair that already exists, before any blob is written.
//! 2. Store the document (and the cover, if any) in the [`BlobStore`].
//! 3. Insert the record with `pdfUrl`/`imageUrl` pointing at the stored names.
//! 4. Return the record with its catalog-assigned id.
//!
//! If step 2 or 3 fails, every blob written so far is removed before the error is returned.
//! If that cleanup itself fails the error becomes [`BookError::CompensationFailed`] and is
//! logged at `error` level, because an orphaned blob now exists on disk.

use crate::catalog::{BookRecord, CatalogRepository, NewBook};
use crate::{BookError, BookResult};
use bibliotek_files::{BlobStore, FilesError, StoredBlob};
use bibliotek_types::NonEmptyText;
use std::sync::Arc;

/// Validated descriptive fields shared by uploads and metadata-only registration.
#[derive(Debug, Clone, PartialEq)]
pub struct BookMetadata {
    pub title: NonEmptyText,
    pub author: NonEmptyText,
    pub category: String,
    pub year: i32,
    pub description: String,
}

impl BookMetadata {
    /// Validate raw request fields.
    ///
    /// # Errors
    ///
    /// Returns `BookError::InvalidInput` if the title or author is blank.
    pub fn new(
        title: &str,
        author: &str,
        category: &str,
        year: i32,
        description: &str,
    ) -> BookResult<Self> {
        let title = NonEmptyText::new(title)
            .map_err(|_| BookError::InvalidInput("title is required".into()))?;
        let author = NonEmptyText::new(author)
            .map_err(|_| BookError::InvalidInput("author is required".into()))?;

        Ok(Self {
            title,
            author,
            category: category.trim().to_string(),
            year,
            description: description.trim().to_string(),
        })
    }

    fn into_new_book(self, pdf_url: String, image_url: Option<String>) -> NewBook {
        NewBook {
            title: self.title,
            author: self.author,
            category: self.category,
            year: self.year,
            description: self.description,
            pdf_url,
            image_url,
        }
    }
}

/// File content received from a client.
#[derive(Clone, PartialEq)]
pub struct UploadedFile {
    pub original_name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// # Errors
    ///
    /// Returns `BookError::InvalidInput` if `content` is empty.
    pub fn new(original_name: impl Into<String>, content: Vec<u8>) -> BookResult<Self> {
        let original_name = original_name.into();
        if content.is_empty() {
            return Err(BookError::InvalidInput(format!(
                "uploaded file '{}' is empty",
                original_name
            )));
        }
        Ok(Self {
            original_name,
            content,
        })
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("original_name", &self.original_name)
            .field("size_bytes", &self.content.len())
            .finish()
    }
}

/// A complete upload, validated at the boundary.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub metadata: BookMetadata,
    pub document: UploadedFile,
    pub cover: Option<UploadedFile>,
}

#[derive(Clone)]
pub struct IngestionCoordinator {
    catalog: Arc<dyn CatalogRepository>,
    blobs: Arc<BlobStore>,
}

impl IngestionCoordinator {
    pub fn new(catalog: Arc<dyn CatalogRepository>, blobs: Arc<BlobStore>) -> Self {
        Self { catalog, blobs }
    }

    /// Runs the full upload flow described in the module docs.
    ///
    /// # Errors
    ///
    /// - `DuplicateEntry` if the (title, author) pair exists; nothing is written
    /// - `StorageWrite` if a blob cannot be stored; no catalog write happens
    /// - any catalog error from the insert, after the stored blobs were removed
    /// - `CompensationFailed` if removing the stored blobs failed as well
    pub fn ingest(&self, request: UploadRequest) -> BookResult<BookRecord> {
        self.ingest_with(request, |name, content| self.blobs.save(name, content))
    }

    /// [`Self::ingest`] with blob writes going through `save`; rollback still uses the store.
    fn ingest_with<S>(&self, request: UploadRequest, mut save: S) -> BookResult<BookRecord>
    where
        S: FnMut(&str, &[u8]) -> Result<StoredBlob, FilesError>,
    {
        let UploadRequest {
            metadata,
            document,
            cover,
        } = request;

        self.ensure_not_duplicate(&metadata)?;

        let pdf = save(&document.original_name, &document.content)
            .map_err(BookError::StorageWrite)?;
        let mut written = vec![pdf.stored_name.clone()];

        let image_url = match cover {
            Some(cover) => match save(&cover.original_name, &cover.content) {
                Ok(stored) => {
                    written.push(stored.stored_name.clone());
                    Some(stored.stored_name)
                }
                Err(e) => return Err(self.compensate(&written, BookError::StorageWrite(e))),
            },
            None => None,
        };

        let new_book = metadata.into_new_book(pdf.stored_name, image_url);
        match self.catalog.insert(new_book) {
            Ok(record) => {
                tracing::info!(
                    "ingested '{}' by '{}' as {} (pdf: {})",
                    record.title,
                    record.author,
                    record.id,
                    record.pdf_url
                );
                Ok(record)
            }
            Err(e) => Err(self.compensate(&written, e)),
        }
    }

    /// Creates a record with no stored document.
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` if the (title, author) pair exists, or any catalog error.
    pub fn register(&self, metadata: BookMetadata) -> BookResult<BookRecord> {
        self.ensure_not_duplicate(&metadata)?;

        let record = self.catalog.insert(metadata.into_new_book(String::new(), None))?;
        tracing::info!(
            "registered '{}' by '{}' as {} without a document",
            record.title,
            record.author,
            record.id
        );
        Ok(record)
    }

    fn ensure_not_duplicate(&self, metadata: &BookMetadata) -> BookResult<()> {
        if self
            .catalog
            .exists_by_title_and_author(metadata.title.as_str(), metadata.author.as_str())?
        {
            tracing::info!(
                "rejected duplicate '{}' by '{}'",
                metadata.title,
                metadata.author
            );
            return Err(BookError::DuplicateEntry {
                title: metadata.title.to_string(),
                author: metadata.author.to_string(),
            });
        }
        Ok(())
    }

    /// Removes the blobs written by a failed ingestion and returns the error to report.
    fn compensate(&self, stored_names: &[String], cause: BookError) -> BookError {
        let failures: Vec<String> = stored_names
            .iter()
            .filter_map(|name| {
                self.blobs
                    .remove(name)
                    .err()
                    .map(|e| format!("{}: {}", name, e))
            })
            .collect();

        if failures.is_empty() {
            tracing::warn!(
                "ingestion rolled back, removed {} blob(s): {}",
                stored_names.len(),
                cause
            );
            return cause;
        }

        let cleanup_error = failures.join("; ");
        tracing::error!(
            "ORPHANED BLOBS: ingestion failed ({}) and cleanup failed: {}",
            cause,
            cleanup_error
        );
        BookError::CompensationFailed {
            stored_names: stored_names.to_vec(),
            cause: Box::new(cause),
            cleanup_error,
        }
    }
}
