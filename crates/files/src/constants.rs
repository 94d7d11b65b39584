//! Naming constants for stored blobs.

/// Name used when sanitising leaves nothing of the original file name.
pub const FALLBACK_ORIGINAL_NAME: &str = "file";

/// Longest sanitised original name kept in a stored name (the tail is kept so the
/// extension survives).
pub const MAX_ORIGINAL_NAME_LEN: usize = 120;

/// Suffix of the hidden file content is written to before being renamed into place.
pub const PARTIAL_SUFFIX: &str = ".partial";
