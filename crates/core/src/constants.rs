//! Constants used throughout the Bibliotek core crate.
//!
//! Path and filename constants live here so the REST server, the CLI and the tests all agree
//! on the on-disk layout.

/// Default directory for uploaded blobs when none is configured.
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Default directory for catalog documents and the user file.
pub const DEFAULT_DATA_DIR: &str = "bibliotek_data";

/// Directory name (under the data directory) holding catalog documents.
pub const CATALOG_DIR_NAME: &str = "catalog";

/// Filename of the user directory file (under the data directory).
pub const USERS_FILENAME: &str = "users.json";

/// Filename of each catalog document inside its sharded record directory.
pub const BOOK_JSON_FILENAME: &str = "book.json";

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8080";

/// Default upper bound on a single upload request body (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
