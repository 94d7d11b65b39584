//! Front-door service used by the REST server and the CLI.

use crate::catalog::{BookRecord, CatalogRepository, FileCatalog};
use crate::config::CoreConfig;
use crate::deletion::{DeletionCoordinator, DeletionReport};
use crate::ingestion::{BookMetadata, IngestionCoordinator, UploadRequest};
use crate::users::{UserAccount, UserDirectory};
use crate::{BookError, BookResult};
use bibliotek_files::{BlobReader, BlobStore, FilesError};
use std::sync::Arc;

/// A stored cover image ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

/// Catalog operations with every dependency injected.
///
/// Cloning is cheap; all clones share the same catalog, blob store and user directory.
#[derive(Clone)]
pub struct BookService {
    catalog: Arc<dyn CatalogRepository>,
    blobs: Arc<BlobStore>,
    users: Arc<UserDirectory>,
    ingestion: IngestionCoordinator,
    deletion: DeletionCoordinator,
}

impl BookService {
    /// Opens the file-backed catalog, blob store and user directory described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog directory cannot be created, the uploads path is not a
    /// directory, or the user file cannot be read or seeded.
    pub fn open(cfg: &CoreConfig) -> BookResult<Self> {
        let catalog = Arc::new(FileCatalog::new(cfg.catalog_dir())?);
        let blobs = Arc::new(BlobStore::new(cfg.uploads_dir()).map_err(BookError::StorageWrite)?);
        let users = Arc::new(UserDirectory::load_or_seed(&cfg.users_file())?);

        Ok(Self::with_parts(catalog, blobs, users))
    }

    /// Assembles a service from explicit parts (used by tests and alternative catalogs).
    pub fn with_parts(
        catalog: Arc<dyn CatalogRepository>,
        blobs: Arc<BlobStore>,
        users: Arc<UserDirectory>,
    ) -> Self {
        Self {
            ingestion: IngestionCoordinator::new(catalog.clone(), blobs.clone()),
            deletion: DeletionCoordinator::new(catalog.clone(), blobs.clone()),
            catalog,
            blobs,
            users,
        }
    }

    pub fn list_books(&self) -> BookResult<Vec<BookRecord>> {
        self.catalog.find_all()
    }

    /// # Errors
    ///
    /// `NotFound` if no record has this id.
    pub fn get_book(&self, id: &str) -> BookResult<BookRecord> {
        self.catalog
            .find_by_id(id)?
            .ok_or_else(|| BookError::NotFound(format!("book {}", id)))
    }

    pub fn search_books(&self, query: &str) -> BookResult<Vec<BookRecord>> {
        self.catalog.search(query)
    }

    pub fn upload_book(&self, request: UploadRequest) -> BookResult<BookRecord> {
        self.ingestion.ingest(request)
    }

    pub fn register_book(&self, metadata: BookMetadata) -> BookResult<BookRecord> {
        self.ingestion.register(metadata)
    }

    pub fn delete_book(&self, id: &str) -> BookResult<DeletionReport> {
        self.deletion.delete(id)
    }

    /// Opens a stored document for streaming.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown, unreadable or invalid names.
    pub fn open_document(&self, stored_name: &str) -> BookResult<BlobReader> {
        self.blobs.load(stored_name).map_err(map_load_error)
    }

    pub fn read_document(&self, stored_name: &str) -> BookResult<Vec<u8>> {
        self.open_document(stored_name)?
            .into_bytes()
            .map_err(BookError::StorageRead)
    }

    /// Reads a cover image and detects its media type.
    pub fn read_cover(&self, stored_name: &str) -> BookResult<CoverImage> {
        let bytes = self.read_document(stored_name)?;
        let media_type = BlobStore::media_type(&bytes).unwrap_or("application/octet-stream");
        Ok(CoverImage { bytes, media_type })
    }

    /// Checks credentials against the user directory.
    pub fn login(&self, username: &str, password: &str) -> BookResult<UserAccount> {
        self.users.authenticate(username, password).cloned()
    }

    pub fn users(&self) -> &[UserAccount] {
        self.users.users()
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }
}

fn map_load_error(e: FilesError) -> BookError {
    match e {
        FilesError::NotFound(name) => BookError::NotFound(format!("file {}", name)),
        FilesError::InvalidName(reason) => {
            tracing::warn!("rejected blob name: {}", reason);
            BookError::NotFound("file".into())
        }
        other => BookError::StorageRead(other),
    }
}
