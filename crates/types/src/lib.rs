//! Validated value types shared by the Bibliotek crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
/// Book titles and authors are carried as `NonEmptyText` from the request boundary onwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Compares against `other` ignoring case and surrounding whitespace.
    ///
    /// Comparison uses Unicode lowercase folding, so `"DON QUIJOTE"` matches `"don quijote"`.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        fold_case(&self.0) == fold_case(other)
    }
}

/// Lowercases and trims `input` for case-insensitive comparisons.
pub fn fold_case(input: &str) -> String {
    input.trim().to_lowercase()
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_whitespace() {
        let text = NonEmptyText::new("  Don Quijote \n").unwrap();
        assert_eq!(text.as_str(), "Don Quijote");
    }

    #[test]
    fn test_new_rejects_blank() {
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new("   \t"), Err(TextError::Empty)));
    }

    #[test]
    fn test_eq_ignore_case() {
        let text = NonEmptyText::new("Cervantes").unwrap();
        assert!(text.eq_ignore_case("CERVANTES"));
        assert!(text.eq_ignore_case(" cervantes "));
        assert!(!text.eq_ignore_case("Cervante"));
    }

    #[test]
    fn test_eq_ignore_case_non_ascii() {
        let text = NonEmptyText::new("García Márquez").unwrap();
        assert!(text.eq_ignore_case("GARCÍA MÁRQUEZ"));
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        let ok: NonEmptyText = serde_json::from_str("\"Fiction\"").unwrap();
        assert_eq!(ok.as_str(), "Fiction");

        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
    }
}
