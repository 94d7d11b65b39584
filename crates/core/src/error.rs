use bibliotek_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("a book titled '{title}' by '{author}' already exists")]
    DuplicateEntry { title: String, author: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to store file: {0}")]
    StorageWrite(FilesError),
    #[error("failed to read stored file: {0}")]
    StorageRead(FilesError),
    #[error("failed to write catalog: {0}")]
    CatalogWrite(std::io::Error),
    #[error("failed to read catalog: {0}")]
    CatalogRead(std::io::Error),
    #[error("failed to serialize book: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize book: {0}")]
    Deserialization(serde_json::Error),
    #[error(
        "ingestion failed and cleanup also failed (blobs: {stored}): cause={cause}; cleanup={cleanup_error}",
        stored = stored_names.join(", ")
    )]
    CompensationFailed {
        stored_names: Vec<String>,
        #[source]
        cause: Box<BookError>,
        cleanup_error: String,
    },
    #[error("invalid credentials")]
    InvalidCredentials,
}

pub type BookResult<T> = std::result::Result<T, BookError>;
