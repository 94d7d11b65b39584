//! Deletion: removing a catalog entry together with its blobs.
//!
//! Blob removal is best-effort. A blob that is already missing, or that cannot be removed,
//! is logged and never stops the catalog record from being deleted: a record pointing at
//! nothing is worse than an unreferenced file nobody can see.

use crate::catalog::CatalogRepository;
use crate::{BookError, BookResult};
use bibliotek_files::BlobStore;
use std::sync::Arc;

/// What a successful deletion actually removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub id: String,
    /// Whether the primary document was removed from disk.
    pub document_deleted: bool,
    /// Whether the cover image was removed from disk.
    pub cover_deleted: bool,
}

#[derive(Clone)]
pub struct DeletionCoordinator {
    catalog: Arc<dyn CatalogRepository>,
    blobs: Arc<BlobStore>,
}

impl DeletionCoordinator {
    pub fn new(catalog: Arc<dyn CatalogRepository>, blobs: Arc<BlobStore>) -> Self {
        Self { catalog, blobs }
    }

    /// Deletes the record `id` and its blobs.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record has this id; nothing is touched
    /// - a catalog error if the record itself cannot be removed
    pub fn delete(&self, id: &str) -> BookResult<DeletionReport> {
        let record = self
            .catalog
            .find_by_id(id)?
            .ok_or_else(|| BookError::NotFound(format!("book {}", id)))?;

        let document_deleted = !record.pdf_url.is_empty() && self.blobs.delete(&record.pdf_url);
        let cover_deleted = record
            .image_url
            .as_deref()
            .filter(|name| !name.is_empty())
            .is_some_and(|name| self.blobs.delete(name));

        if !self.catalog.delete_by_id(id)? {
            // Removed concurrently between lookup and delete.
            return Err(BookError::NotFound(format!("book {}", id)));
        }

        tracing::info!(
            "deleted book {} (document removed: {}, cover removed: {})",
            id,
            document_deleted,
            cover_deleted
        );

        Ok(DeletionReport {
            id: id.to_string(),
            document_deleted,
            cover_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogRepository, MemoryCatalog, NewBook};
    use crate::ingestion::{BookMetadata, IngestionCoordinator, UploadRequest, UploadedFile};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        catalog: Arc<MemoryCatalog>,
        blobs: Arc<BlobStore>,
        ingestion: IngestionCoordinator,
        deletion: DeletionCoordinator,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let blobs = Arc::new(BlobStore::new(temp.path().join("uploads")).unwrap());
        Fixture {
            ingestion: IngestionCoordinator::new(catalog.clone(), blobs.clone()),
            deletion: DeletionCoordinator::new(catalog.clone(), blobs.clone()),
            _temp: temp,
            catalog,
            blobs,
        }
    }

    fn upload(with_cover: bool) -> UploadRequest {
        UploadRequest {
            metadata: BookMetadata::new("Don Quijote", "Cervantes", "Fiction", 1605, "...")
                .unwrap(),
            document: UploadedFile::new("fileA", b"%PDF".to_vec()).unwrap(),
            cover: with_cover.then(|| UploadedFile::new("cover.jpg", b"jpeg".to_vec()).unwrap()),
        }
    }

    #[test]
    fn test_delete_removes_record_and_blobs() {
        let fx = fixture();
        let record = fx.ingestion.ingest(upload(true)).unwrap();
        let id = record.id.to_string();

        let report = fx.deletion.delete(&id).unwrap();

        assert!(report.document_deleted);
        assert!(report.cover_deleted);
        assert!(fx.catalog.find_by_id(&id).unwrap().is_none());
        assert!(fx.blobs.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_with_blob_already_missing() {
        let fx = fixture();
        let record = fx.ingestion.ingest(upload(false)).unwrap();
        let id = record.id.to_string();

        std::fs::remove_file(fx.blobs.root_directory().join(&record.pdf_url)).unwrap();

        let report = fx.deletion.delete(&id).unwrap();

        assert!(!report.document_deleted);
        assert!(fx.catalog.find_by_id(&id).unwrap().is_none());
    }

    #[test]
    fn test_delete_with_invalid_stored_name_still_removes_record() {
        let fx = fixture();
        let record = fx
            .catalog
            .insert(NewBook {
                pdf_url: "../../outside.pdf".into(),
                ..crate::catalog::test_support::new_book("Don Quijote", "Cervantes")
            })
            .unwrap();
        let id = record.id.to_string();

        let report = fx.deletion.delete(&id).unwrap();

        assert!(!report.document_deleted);
        assert!(fx.catalog.find_by_id(&id).unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_id_changes_nothing() {
        let fx = fixture();
        let record = fx.ingestion.ingest(upload(false)).unwrap();
        let blobs_before = fx.blobs.list().unwrap();

        let result = fx.deletion.delete("0123456789abcdef0123456789abcdef");

        assert!(matches!(result, Err(BookError::NotFound(_))));
        assert_eq!(fx.blobs.list().unwrap(), blobs_before);
        assert_eq!(fx.catalog.find_all().unwrap(), vec![record]);
    }

    #[test]
    fn test_delete_metadata_only_record() {
        let fx = fixture();
        let record = fx
            .ingestion
            .register(BookMetadata::new("Lazarillo", "Anónimo", "", 1554, "").unwrap())
            .unwrap();

        let report = fx.deletion.delete(&record.id.to_string()).unwrap();

        assert!(!report.document_deleted);
        assert!(!report.cover_deleted);
    }

    #[test]
    fn test_delete_twice_reports_not_found() {
        let fx = fixture();
        let record = fx.ingestion.ingest(upload(false)).unwrap();
        let id = record.id.to_string();

        fx.deletion.delete(&id).unwrap();
        assert!(matches!(fx.deletion.delete(&id), Err(BookError::NotFound(_))));
    }
}
