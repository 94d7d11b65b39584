//! # Bibliotek Core
//!
//! Core business logic for the Bibliotek library catalog.
//!
//! This crate contains the catalog and storage operations:
//! - the [`catalog::CatalogRepository`] abstraction and its file/memory implementations
//! - duplicate-safe ingestion with compensation ([`ingestion`])
//! - record + blob deletion ([`deletion`])
//! - the fixed user accounts and login check ([`users`])
//! - [`BookService`], the facade the front ends call
//!
//! **No API concerns**: HTTP routing, multipart parsing and status codes belong in `api-rest`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod deletion;
pub mod error;
pub mod ingestion;
pub mod service;
pub mod users;

pub use bibliotek_files::{BlobReader, BlobStore, StoredBlob};
pub use bibliotek_types::NonEmptyText;
pub use bibliotek_uuid::CanonicalId;
pub use catalog::{BookRecord, CatalogRepository, FileCatalog, MemoryCatalog, NewBook};
pub use config::CoreConfig;
pub use constants::{DEFAULT_DATA_DIR, DEFAULT_REST_ADDR, DEFAULT_UPLOADS_DIR};
pub use deletion::{DeletionCoordinator, DeletionReport};
pub use error::{BookError, BookResult};
pub use ingestion::{BookMetadata, IngestionCoordinator, UploadRequest, UploadedFile};
pub use service::{BookService, CoverImage};
pub use users::{Role, UserAccount, UserDirectory};
