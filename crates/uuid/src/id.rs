use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Bibliotek's canonical identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to render in canonical form, so it can be
/// used directly as a record key, a blob-name token or a directory name.
///
/// # Construction
/// - [`CanonicalId::new`] generates a fresh random (v4) identifier.
/// - [`CanonicalId::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalId(Uuid);

impl Default for CanonicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalId {
    /// Generates a new random identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are not normalised; they are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "identifier must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("'{}': {}", input, e)))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is exactly 32 characters of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are the first two hex pairs.
    ///
    /// Sharding keeps any single directory from accumulating every catalog record.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for CanonicalId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CanonicalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CanonicalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CanonicalId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = CanonicalId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 32);
        assert!(CanonicalId::is_canonical(&s));
    }

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(CanonicalId::new(), CanonicalId::new());
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let input = "550e8400e29b41d4a716446655440000";
        let id = CanonicalId::parse(input).unwrap();
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_hyphenated() {
        let result = CanonicalId::parse("550e8400-e29b-41d4-a716-446655440000");
        assert!(matches!(result, Err(UuidError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        assert!(CanonicalId::parse("550E8400E29B41D4A716446655440000").is_err());
    }

    #[test]
    fn test_parse_rejects_path_like_input() {
        assert!(CanonicalId::parse("../../../../etc/passwd").is_err());
        assert!(CanonicalId::parse("550e8400e29b41d4a71644665544/../").is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(CanonicalId::parse("550e8400").is_err());
        assert!(CanonicalId::parse("550e8400e29b41d4a716446655440000ab").is_err());
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = CanonicalId::parse("abcdef0123456789abcdef0123456789").unwrap();
        let dir = id.sharded_dir(Path::new("/catalog"));
        assert_eq!(
            dir,
            PathBuf::from("/catalog/ab/cd/abcdef0123456789abcdef0123456789")
        );
    }

    #[test]
    fn test_from_str_matches_parse() {
        let id: CanonicalId = "0123456789abcdef0123456789abcdef".parse().unwrap();
        assert_eq!(id.to_string(), "0123456789abcdef0123456789abcdef");
        assert!("nope".parse::<CanonicalId>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = CanonicalId::parse("0123456789abcdef0123456789abcdef").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0123456789abcdef0123456789abcdef\"");

        let back: CanonicalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<CanonicalId>("\"NOT-CANONICAL\"").is_err());
    }
}
