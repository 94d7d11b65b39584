//! Bibliotek Blob Storage
//!
//! This crate stores the binary side of the catalog: uploaded PDFs and cover images.
//!
//! ## Design Principles
//!
//! - Every blob lives directly under one root directory, created lazily on first save
//! - Stored names are generated, never chosen by the caller: `<32-hex token>_<sanitised name>`
//! - Two uploads sharing an original file name never collide
//! - Writes land in a hidden partial file and are renamed into place
//! - Names handed back to the store are validated before touching the filesystem, so no
//!   name can resolve outside the root
//! - Best-effort deletion never fails the caller's larger operation
//!
//! ## Layout
//!
//! ```text
//! uploads/
//! ├── 550e8400e29b41d4a716446655440000_don_quijote.pdf
//! └── 9b1c2f0e7d3a4b5c8e6f00112233aabb_cover.png
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use bibliotek_files::BlobStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = BlobStore::new("uploads")?;
//! let stored = store.save("don quijote.pdf", b"%PDF-1.7")?;
//! let bytes = store.read(&stored.stored_name)?;
//! assert_eq!(bytes, b"%PDF-1.7");
//! # Ok(())
//! # }
//! ```

mod constants;
mod name;
mod store;

pub use constants::{FALLBACK_ORIGINAL_NAME, MAX_ORIGINAL_NAME_LEN, PARTIAL_SUFFIX};
pub use name::{sanitise_original_name, validate_stored_name};
pub use store::{BlobReader, BlobStore, StoredBlob};

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root path exists but is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Stored name failed validation (potential directory traversal or unsafe name)
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    /// No readable blob exists under the given name
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Creating the root or writing content failed
    #[error("Failed to write blob: {0}")]
    Write(std::io::Error),

    /// Reading stored content failed
    #[error("Failed to read blob: {0}")]
    Read(std::io::Error),

    /// Removing a stored blob failed
    #[error("Failed to delete blob: {0}")]
    Delete(std::io::Error),
}
