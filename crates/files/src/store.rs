//! Root-scoped blob storage implementation
//!
//! [`BlobStore`] owns exactly one directory. Every stored blob is a direct child of it, named
//! `<token>_<sanitised original name>` where the token is a fresh [`CanonicalId`]. Nothing
//! outside the root is ever read, written or removed: stored names coming back from callers
//! are checked by [`validate_stored_name`] first.
//!
//! # Write protocol
//!
//! Content is written to `.<stored name>.partial` and then renamed to its final name. A crash
//! or a failed write never leaves a truncated file under a name a catalog record could point
//! at, and repeating a save is harmless.
//!
//! # Deletion
//!
//! [`BlobStore::remove`] is the strict form and reports I/O failures. [`BlobStore::delete`]
//! is the best-effort form used when a catalog entry is being removed: failures are logged and
//! reported as "not deleted".

use crate::constants::PARTIAL_SUFFIX;
use crate::name::{sanitise_original_name, validate_stored_name};
use crate::FilesError;
use bibliotek_uuid::CanonicalId;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Metadata describing a blob that was just stored.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredBlob {
    /// Generated name the blob is addressed by from now on
    pub stored_name: String,

    /// Sanitised form of the client-supplied file name
    pub original_name: String,

    /// Size of the content in bytes
    pub size_bytes: u64,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    /// Detected media type (MIME type), if available
    ///
    /// Best-effort detection from magic bytes; not authoritative.
    pub media_type: Option<String>,

    /// UTC timestamp when the blob was stored
    pub stored_at: DateTime<Utc>,
}

/// Readable handle on a stored blob.
///
/// Returned by [`BlobStore::load`] once the blob has been found and opened.
#[derive(Debug)]
pub struct BlobReader {
    stored_name: String,
    size: u64,
    file: fs::File,
}

impl BlobReader {
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Size of the blob in bytes at the time it was opened.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads the remaining content into memory.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Read`] if reading fails part-way.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, FilesError> {
        let mut buffer = Vec::with_capacity(self.size as usize);
        self.file.read_to_end(&mut buffer).map_err(|e| {
            FilesError::Read(io::Error::new(
                e.kind(),
                format!("Failed to read blob {}: {}", self.stored_name, e),
            ))
        })?;
        Ok(buffer)
    }

    /// Hands over the open file, positioned wherever reading stopped.
    pub fn into_file(self) -> fs::File {
        self.file
    }
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Service for storing blobs under a single root directory
///
/// The store is cheap to share behind an `Arc`; it holds no state besides the root path.
/// Concurrent saves never collide because every save draws a fresh random token.
#[derive(Debug)]
pub struct BlobStore {
    root_directory: PathBuf,
}

impl BlobStore {
    /// Creates a store rooted at `root_directory`.
    ///
    /// The directory does not need to exist yet; it is created on the first save.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the path exists but is not a directory.
    pub fn new(root_directory: impl Into<PathBuf>) -> Result<Self, FilesError> {
        let root_directory = root_directory.into();

        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        Ok(Self { root_directory })
    }

    /// Returns the root directory all blobs are stored under.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Stores `content` under a freshly generated name derived from `original_name`.
    ///
    /// # Returns
    ///
    /// [`StoredBlob`] metadata; its `stored_name` is what catalog records reference.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Write`] if:
    /// - the root directory cannot be created
    /// - the partial file cannot be written (disk full, permission denied)
    /// - the partial file cannot be renamed into place
    pub fn save(&self, original_name: &str, content: &[u8]) -> Result<StoredBlob, FilesError> {
        self.ensure_root()?;

        let original_name = sanitise_original_name(original_name);
        let stored_name = format!("{}_{}", CanonicalId::new(), original_name);
        let final_path = self.root_directory.join(&stored_name);
        let partial_path = self
            .root_directory
            .join(format!(".{}{}", stored_name, PARTIAL_SUFFIX));

        if let Err(e) = fs::write(&partial_path, content) {
            let _ = fs::remove_file(&partial_path);
            return Err(FilesError::Write(io::Error::new(
                e.kind(),
                format!("Failed to write blob to {}: {}", partial_path.display(), e),
            )));
        }

        if let Err(e) = fs::rename(&partial_path, &final_path) {
            let _ = fs::remove_file(&partial_path);
            return Err(FilesError::Write(io::Error::new(
                e.kind(),
                format!(
                    "Failed to move blob into place at {}: {}",
                    final_path.display(),
                    e
                ),
            )));
        }

        let sha256 = hex::encode(Sha256::digest(content));
        let media_type = Self::media_type(content).map(str::to_string);

        tracing::info!(
            stored_name = %stored_name,
            size_bytes = content.len(),
            sha256 = %sha256,
            "stored blob"
        );

        Ok(StoredBlob {
            stored_name,
            original_name,
            size_bytes: content.len() as u64,
            sha256,
            media_type,
            stored_at: Utc::now(),
        })
    }

    /// Opens a stored blob for reading.
    ///
    /// # Errors
    ///
    /// - [`FilesError::InvalidName`] if the name fails validation
    /// - [`FilesError::NotFound`] if nothing readable exists under the name
    pub fn load(&self, stored_name: &str) -> Result<BlobReader, FilesError> {
        let path = self.resolve(stored_name)?;

        let metadata = fs::metadata(&path)
            .map_err(|_| FilesError::NotFound(stored_name.to_string()))?;
        if !metadata.is_file() {
            return Err(FilesError::NotFound(stored_name.to_string()));
        }

        let file =
            fs::File::open(&path).map_err(|_| FilesError::NotFound(stored_name.to_string()))?;

        Ok(BlobReader {
            stored_name: stored_name.to_string(),
            size: metadata.len(),
            file,
        })
    }

    /// Reads a whole blob into memory.
    ///
    /// # Errors
    ///
    /// As [`Self::load`], plus [`FilesError::Read`] if reading fails part-way.
    pub fn read(&self, stored_name: &str) -> Result<Vec<u8>, FilesError> {
        self.load(stored_name)?.into_bytes()
    }

    /// Returns true if a regular file exists under `stored_name`.
    ///
    /// Invalid names are reported as absent.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.resolve(stored_name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Removes a stored blob, reporting whether anything was removed.
    ///
    /// A missing blob is `Ok(false)`, which makes repeated removal idempotent.
    ///
    /// # Errors
    ///
    /// - [`FilesError::InvalidName`] if the name fails validation
    /// - [`FilesError::Delete`] if the file exists but cannot be removed
    pub fn remove(&self, stored_name: &str) -> Result<bool, FilesError> {
        let path = self.resolve(stored_name)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FilesError::Delete(io::Error::new(
                e.kind(),
                format!("Failed to remove blob {}: {}", path.display(), e),
            ))),
        }
    }

    /// Best-effort removal: never fails, logs problems, returns whether a file was removed.
    pub fn delete(&self, stored_name: &str) -> bool {
        match self.remove(stored_name) {
            Ok(true) => {
                tracing::info!("deleted blob: {}", stored_name);
                true
            }
            Ok(false) => {
                tracing::info!("blob did not exist on disk: {}", stored_name);
                false
            }
            Err(e) => {
                tracing::warn!("failed to delete blob {}: {}", stored_name, e);
                false
            }
        }
    }

    /// Lists stored names, sorted. Partial files are skipped.
    ///
    /// A root that has not been created yet lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Read`] if the root exists but cannot be listed.
    pub fn list(&self) -> Result<Vec<String>, FilesError> {
        let entries = match fs::read_dir(&self.root_directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FilesError::Read(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(FilesError::Read)?;
            if !entry.file_type().map_err(FilesError::Read)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Best-effort media type detection from magic bytes.
    pub fn media_type(content: &[u8]) -> Option<&'static str> {
        infer::get(content).map(|kind| kind.mime_type())
    }

    fn ensure_root(&self) -> Result<(), FilesError> {
        fs::create_dir_all(&self.root_directory).map_err(|e| {
            FilesError::Write(io::Error::new(
                e.kind(),
                format!(
                    "Failed to create blob root {}: {}",
                    self.root_directory.display(),
                    e
                ),
            ))
        })
    }

    fn resolve(&self, stored_name: &str) -> Result<PathBuf, FilesError> {
        validate_stored_name(stored_name)?;
        Ok(self.root_directory.join(stored_name))
    }
}
