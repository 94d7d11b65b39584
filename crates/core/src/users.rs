//! The two fixed catalog accounts and the login check.
//!
//! Accounts are read from `users.json` in the data directory. When that file is missing or
//! holds no accounts, it is seeded with the default administrator and reader.
//!
//! Passwords are stored and compared in plain text.

use crate::{BookError, BookResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Can upload and delete books.
    Admin,
    /// Read-only access.
    Lector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Lector => "LECTOR",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<UserAccount>,
}

impl UserDirectory {
    /// The default accounts: `admin`/`admin` (ADMIN) and `lector`/`1234` (LECTOR).
    pub fn seeded() -> Self {
        Self {
            users: vec![
                UserAccount {
                    username: "admin".into(),
                    password: "admin".into(),
                    role: Role::Admin,
                },
                UserAccount {
                    username: "lector".into(),
                    password: "1234".into(),
                    role: Role::Lector,
                },
            ],
        }
    }

    /// Loads accounts from `path`, seeding the file first if it is missing or empty.
    ///
    /// # Errors
    ///
    /// Returns `BookError::CatalogRead`/`CatalogWrite` on I/O failure and
    /// `BookError::Deserialization` if the file exists but is not valid JSON.
    pub fn load_or_seed(path: &Path) -> BookResult<Self> {
        let existing: Vec<UserAccount> = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(BookError::Deserialization)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(BookError::CatalogRead(e)),
        };

        if !existing.is_empty() {
            return Ok(Self { users: existing });
        }

        let seeded = Self::seeded();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BookError::CatalogWrite)?;
        }
        let json = serde_json::to_string_pretty(&seeded.users).map_err(BookError::Serialization)?;
        fs::write(path, json).map_err(BookError::CatalogWrite)?;

        tracing::info!("seeded default user accounts in {}", path.display());
        Ok(seeded)
    }

    pub fn users(&self) -> &[UserAccount] {
        &self.users
    }

    /// Checks a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `BookError::InvalidCredentials` for an unknown user or a wrong password; the two
    /// cases are indistinguishable to the caller.
    pub fn authenticate(&self, username: &str, password: &str) -> BookResult<&UserAccount> {
        match self.users.iter().find(|u| u.username == username) {
            Some(user) if user.password == password => {
                tracing::info!("login succeeded for {} with role {}", username, user.role);
                Ok(user)
            }
            Some(_) => {
                tracing::warn!("login failed for {}: wrong password", username);
                Err(BookError::InvalidCredentials)
            }
            None => {
                tracing::warn!("login failed: unknown user {}", username);
                Err(BookError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_authenticate_seeded_accounts() {
        let users = UserDirectory::seeded();

        assert_eq!(users.authenticate("admin", "admin").unwrap().role, Role::Admin);
        assert_eq!(
            users.authenticate("lector", "1234").unwrap().role,
            Role::Lector
        );
    }

    #[test]
    fn test_authenticate_rejects_bad_credentials() {
        let users = UserDirectory::seeded();

        assert!(matches!(
            users.authenticate("admin", "wrong"),
            Err(BookError::InvalidCredentials)
        ));
        assert!(matches!(
            users.authenticate("nobody", "admin"),
            Err(BookError::InvalidCredentials)
        ));
        assert!(users.authenticate("ADMIN", "admin").is_err());
    }

    #[test]
    fn test_load_or_seed_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("users.json");

        let users = UserDirectory::load_or_seed(&path).unwrap();

        assert_eq!(users.users().len(), 2);
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"ADMIN\""));
        assert!(on_disk.contains("\"LECTOR\""));
    }

    #[test]
    fn test_load_or_seed_keeps_existing_accounts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users.json");
        fs::write(
            &path,
            r#"[{"username":"bibliotecaria","password":"s3cret","role":"ADMIN"}]"#,
        )
        .unwrap();

        let users = UserDirectory::load_or_seed(&path).unwrap();

        assert_eq!(users.users().len(), 1);
        assert!(users.authenticate("bibliotecaria", "s3cret").is_ok());
        assert!(users.authenticate("admin", "admin").is_err());
    }

    #[test]
    fn test_load_or_seed_reseeds_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users.json");
        fs::write(&path, "[]").unwrap();

        let users = UserDirectory::load_or_seed(&path).unwrap();
        assert!(users.authenticate("admin", "admin").is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let users = UserDirectory::seeded();
        let debug = format!("{:?}", users);
        assert!(debug.contains("lector"));
        assert!(!debug.contains("1234"));
    }
}
