//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Request handling never reads process-wide environment variables; the binaries read them in
//! `main` and hand the raw values to the helpers below.

use crate::constants::{CATALOG_DIR_NAME, DEFAULT_MAX_UPLOAD_BYTES, USERS_FILENAME};
use crate::{BookError, BookResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    uploads_dir: PathBuf,
    data_dir: PathBuf,
    max_upload_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `BookError::InvalidInput` if `max_upload_bytes` is zero, or if the uploads
    /// directory would share a directory with catalog documents.
    pub fn new(
        uploads_dir: PathBuf,
        data_dir: PathBuf,
        max_upload_bytes: usize,
    ) -> BookResult<Self> {
        if max_upload_bytes == 0 {
            return Err(BookError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        let cfg = Self {
            uploads_dir,
            data_dir,
            max_upload_bytes,
        };

        if cfg.uploads_dir == cfg.data_dir || cfg.uploads_dir == cfg.catalog_dir() {
            return Err(BookError::InvalidInput(
                "uploads directory must be separate from the catalog data directory".into(),
            ));
        }

        Ok(cfg)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join(CATALOG_DIR_NAME)
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join(USERS_FILENAME)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

/// Resolve a directory from an optional environment value.
///
/// `None` or blank values fall back to `default`.
pub fn dir_from_env_value(value: Option<String>, default: &str) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Parse the upload size limit from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_UPLOAD_BYTES`].
///
/// # Errors
///
/// Returns `BookError::InvalidInput` if the value is not a positive integer.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> BookResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(BookError::InvalidInput(format!(
                "BIBLIOTEK_MAX_UPLOAD_BYTES must be a positive integer, got '{}'",
                v
            ))),
            Ok(n) => Ok(n),
        },
    }
}
