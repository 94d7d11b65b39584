//! Canonical identifiers and sharded-path utilities.
//!
//! Bibliotek uses one identifier shape everywhere it needs an opaque, collision-free name:
//! catalog record ids and the random token prefixed to every stored blob name. The canonical
//! form is **32 lowercase hexadecimal characters** (no hyphens), which is what
//! `Uuid::new_v4().simple().to_string()` produces.
//!
//! Canonical form is *required* for externally supplied identifiers (path segments, CLI
//! arguments). [`CanonicalId::parse`] rejects uppercase, hyphenated, wrong-length or non-hex
//! input, which also makes a parsed id safe to use as a filesystem path component.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, catalog documents live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `bibliotek_data/catalog/55/0e/550e8400e29b41d4a716446655440000/`

mod id;

pub use id::{CanonicalId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
