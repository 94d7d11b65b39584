//! Sanitising client-supplied file names and validating stored names.

use crate::constants::{FALLBACK_ORIGINAL_NAME, MAX_ORIGINAL_NAME_LEN};
use crate::FilesError;
use std::path::{Component, Path};

/// Reduces a client-supplied file name to a safe, single path component.
///
/// - only the final component is kept (both `/` and `\` count as separators)
/// - characters outside `[A-Za-z0-9._-]` become `_`
/// - leading dots are stripped, so the result is never hidden, `.` or `..`
/// - overly long names keep their tail, preserving the extension
/// - an empty result falls back to [`FALLBACK_ORIGINAL_NAME`]
pub fn sanitise_original_name(original: &str) -> String {
    let last = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let mapped: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Mapped output is pure ASCII, so byte slicing is on char boundaries.
    let tail = if mapped.len() > MAX_ORIGINAL_NAME_LEN {
        &mapped[mapped.len() - MAX_ORIGINAL_NAME_LEN..]
    } else {
        mapped.as_str()
    };

    let trimmed = tail.trim_start_matches('.');
    if trimmed.is_empty() {
        FALLBACK_ORIGINAL_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Checks that `stored_name` can only resolve to a direct child of the blob root.
///
/// # Errors
///
/// Returns [`FilesError::InvalidName`] if the name is empty, contains a path separator or NUL,
/// starts with a dot (hidden, `.`, `..`, partial files), or is not a single normal component.
pub fn validate_stored_name(stored_name: &str) -> Result<(), FilesError> {
    if stored_name.is_empty() {
        return Err(FilesError::InvalidName("name is empty".into()));
    }

    if stored_name.contains(['/', '\\', '\0']) {
        return Err(FilesError::InvalidName(format!(
            "name contains a path separator: {:?}",
            stored_name
        )));
    }

    if stored_name.starts_with('.') {
        return Err(FilesError::InvalidName(format!(
            "name must not start with '.': {:?}",
            stored_name
        )));
    }

    let mut components = Path::new(stored_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(FilesError::InvalidName(format!(
            "name is not a single path component: {:?}",
            stored_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitise_keeps_safe_names() {
        assert_eq!(sanitise_original_name("fileA.pdf"), "fileA.pdf");
        assert_eq!(sanitise_original_name("my-book_v2.pdf"), "my-book_v2.pdf");
    }

    #[test]
    fn test_sanitise_strips_directories() {
        assert_eq!(sanitise_original_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitise_original_name("C:\\Users\\ana\\libro.pdf"), "libro.pdf");
    }

    #[test]
    fn test_sanitise_replaces_unsafe_characters() {
        assert_eq!(sanitise_original_name("Don Quijote.pdf"), "Don_Quijote.pdf");
        assert_eq!(sanitise_original_name("año 1605?.pdf"), "a_o_1605_.pdf");
    }

    #[test]
    fn test_sanitise_strips_leading_dots() {
        assert_eq!(sanitise_original_name(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitise_original_name(".."), FALLBACK_ORIGINAL_NAME);
    }

    #[test]
    fn test_sanitise_falls_back_when_empty() {
        assert_eq!(sanitise_original_name(""), FALLBACK_ORIGINAL_NAME);
        assert_eq!(sanitise_original_name("dir/"), FALLBACK_ORIGINAL_NAME);
    }

    #[test]
    fn test_sanitise_truncates_keeping_extension() {
        let long = format!("{}.pdf", "a".repeat(400));
        let sanitised = sanitise_original_name(&long);
        assert_eq!(sanitised.len(), MAX_ORIGINAL_NAME_LEN);
        assert!(sanitised.ends_with(".pdf"));
    }

    #[test]
    fn test_validate_accepts_generated_names() {
        assert!(validate_stored_name("550e8400e29b41d4a716446655440000_fileA.pdf").is_ok());
        // A doubled dot inside a single component cannot escape the root.
        assert!(validate_stored_name("abc_vol..2.pdf").is_ok());
    }

    #[test]
    fn test_validate_rejects_traversal() {
        for bad in [
            "",
            ".",
            "..",
            "../secret",
            "..\\secret",
            "a/b",
            "/etc/passwd",
            ".abc.partial",
            "nul\0byte",
        ] {
            assert!(
                matches!(validate_stored_name(bad), Err(FilesError::InvalidName(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }
}
