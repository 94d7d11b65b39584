//! Filesystem-backed catalog.
//!
//! Each record is a JSON document stored at:
//! `<catalog_dir>/<s1>/<s2>/<id>/book.json`
//! where `s1`/`s2` are the first two hex pairs of the canonical id.

use super::{sort_records, BookRecord, CatalogRepository, NewBook};
use crate::constants::BOOK_JSON_FILENAME;
use crate::{BookError, BookResult};
use bibliotek_uuid::CanonicalId;
use chrono::Utc;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Catalog persisted as sharded JSON documents.
///
/// Inserts and deletes are serialised through an internal lock so the (title, author)
/// uniqueness check and the write form one unit within this process.
#[derive(Debug)]
pub struct FileCatalog {
    catalog_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCatalog {
    /// Opens (creating if needed) a catalog rooted at `catalog_dir`.
    ///
    /// # Errors
    ///
    /// Returns `BookError::CatalogWrite` if the directory cannot be created.
    pub fn new(catalog_dir: impl Into<PathBuf>) -> BookResult<Self> {
        let catalog_dir = catalog_dir.into();
        fs::create_dir_all(&catalog_dir).map_err(BookError::CatalogWrite)?;

        Ok(Self {
            catalog_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_record(path: &Path) -> BookResult<Option<BookRecord>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BookError::CatalogRead(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(BookError::Deserialization)
    }

    /// Lists one shard level, logging and skipping it when it cannot be read.
    fn read_shard(path: &Path) -> Option<fs::ReadDir> {
        match fs::read_dir(path) {
            Ok(it) => Some(it),
            Err(e) => {
                tracing::warn!(
                    "skipping unreadable catalog shard {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Allocates a fresh id and creates its record directory.
    ///
    /// Guards against pathological id collisions (or directories left behind by external
    /// interference) by retrying a bounded number of times.
    fn allocate_record_dir(&self) -> BookResult<(CanonicalId, PathBuf)> {
        for _attempt in 0..5 {
            let id = CanonicalId::new();
            let candidate = id.sharded_dir(&self.catalog_dir);

            if candidate.exists() {
                continue;
            }

            if let Some(parent) = candidate.parent() {
                fs::create_dir_all(parent).map_err(BookError::CatalogWrite)?;
            }

            match fs::create_dir(&candidate) {
                Ok(()) => return Ok((id, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(BookError::CatalogWrite(e)),
            }
        }

        Err(BookError::CatalogWrite(io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to allocate a unique catalog record directory after 5 attempts",
        )))
    }

    fn write_record(record_dir: &Path, record: &BookRecord) -> BookResult<()> {
        let json = serde_json::to_string_pretty(record).map_err(BookError::Serialization)?;
        let final_path = record_dir.join(BOOK_JSON_FILENAME);
        let partial_path = record_dir.join(format!(".{}.partial", BOOK_JSON_FILENAME));

        fs::write(&partial_path, json).map_err(BookError::CatalogWrite)?;
        fs::rename(&partial_path, &final_path).map_err(BookError::CatalogWrite)
    }
}

impl CatalogRepository for FileCatalog {
    fn find_all(&self) -> BookResult<Vec<BookRecord>> {
        let mut records = Vec::new();

        let s1_iter = match fs::read_dir(&self.catalog_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(BookError::CatalogRead(e)),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let Some(s2_iter) = Self::read_shard(&s1_path) else {
                continue;
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let Some(id_iter) = Self::read_shard(&s2_path) else {
                    continue;
                };

                for id_ent in id_iter.flatten() {
                    let book_path = id_ent.path().join(BOOK_JSON_FILENAME);
                    match Self::read_record(&book_path) {
                        Ok(Some(record)) => records.push(record),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(
                                "skipping unreadable catalog document {}: {}",
                                book_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        sort_records(&mut records);
        Ok(records)
    }

    fn find_by_id(&self, id: &str) -> BookResult<Option<BookRecord>> {
        let Ok(id) = CanonicalId::parse(id) else {
            return Ok(None);
        };

        Self::read_record(&id.sharded_dir(&self.catalog_dir).join(BOOK_JSON_FILENAME))
    }

    fn insert(&self, book: NewBook) -> BookResult<BookRecord> {
        let _guard = self.lock();

        if self.exists_by_title_and_author(book.title.as_str(), book.author.as_str())? {
            return Err(book.duplicate_error());
        }

        let (id, record_dir) = self.allocate_record_dir()?;
        let record = book.into_record(id, Utc::now());

        if let Err(e) = Self::write_record(&record_dir, &record) {
            if let Err(cleanup) = fs::remove_dir_all(&record_dir) {
                tracing::error!(
                    "failed to clean up catalog directory {} after write error: {}",
                    record_dir.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!("catalog record created: {}", record.id);
        Ok(record)
    }

    fn delete_by_id(&self, id: &str) -> BookResult<bool> {
        let Ok(id) = CanonicalId::parse(id) else {
            return Ok(false);
        };

        let _guard = self.lock();
        match fs::remove_dir_all(id.sharded_dir(&self.catalog_dir)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BookError::CatalogWrite(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::new_book;
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn catalog(temp: &TempDir) -> FileCatalog {
        FileCatalog::new(temp.path().join("catalog")).unwrap()
    }

    #[test]
    fn test_new_creates_directory() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);
        assert!(catalog.catalog_dir().is_dir());
        assert!(catalog.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_insert_writes_sharded_document() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        let record = catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();

        let expected = record
            .id
            .sharded_dir(catalog.catalog_dir())
            .join(BOOK_JSON_FILENAME);
        assert!(expected.is_file());

        let found = catalog.find_by_id(&record.id.to_string()).unwrap();
        assert_eq!(found, Some(record));
    }

    #[test]
    fn test_insert_rejects_case_insensitive_duplicate() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();
        let result = catalog.insert(new_book("DON QUIJOTE", "cervantes"));

        assert!(matches!(result, Err(BookError::DuplicateEntry { .. })));
        assert_eq!(catalog.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_duplicate_inserts_create_one_record() {
        let temp = TempDir::new().unwrap();
        let catalog = Arc::new(catalog(&temp));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || catalog.insert(new_book("La Celestina", "Rojas")))
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(successes, 1);
        assert_eq!(catalog.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_id_unknown_or_malformed() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        assert!(catalog
            .find_by_id("0123456789abcdef0123456789abcdef")
            .unwrap()
            .is_none());
        assert!(catalog.find_by_id("../../etc").unwrap().is_none());
        assert!(catalog.find_by_id("").unwrap().is_none());
    }

    #[test]
    fn test_search_and_exists() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();
        catalog.insert(new_book("Novelas ejemplares", "Cervantes")).unwrap();
        catalog.insert(new_book("Fuenteovejuna", "Lope de Vega")).unwrap();

        assert_eq!(catalog.search("cervantes").unwrap().len(), 2);
        assert_eq!(catalog.search("OVEJUNA").unwrap().len(), 1);
        assert!(catalog
            .exists_by_title_and_author("fuenteovejuna", "LOPE DE VEGA")
            .unwrap());
        assert!(!catalog
            .exists_by_title_and_author("Fuenteovejuna", "Cervantes")
            .unwrap());
    }

    #[test]
    fn test_find_all_skips_corrupt_documents() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        let good = catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();

        let bad_dir = CanonicalId::new().sharded_dir(catalog.catalog_dir());
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join(BOOK_JSON_FILENAME), "{ not json").unwrap();

        let all = catalog.find_all().unwrap();
        assert_eq!(all, vec![good]);
    }

    #[test]
    fn test_read_shard_skips_unlistable_directory() {
        let temp = TempDir::new().unwrap();

        assert!(FileCatalog::read_shard(&temp.path().join("gone")).is_none());
        assert!(FileCatalog::read_shard(temp.path()).is_some());
    }

    #[test]
    fn test_find_all_ignores_stray_entries_between_shards() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        let good = catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();

        fs::write(catalog.catalog_dir().join("notes.txt"), "stray").unwrap();
        let shard = fs::read_dir(catalog.catalog_dir())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .find(|p| p.is_dir())
            .unwrap();
        fs::write(shard.join("stray"), "stray").unwrap();

        assert_eq!(catalog.find_all().unwrap(), vec![good]);
    }

    #[test]
    fn test_delete_by_id() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp);

        let record = catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();
        let id = record.id.to_string();

        assert!(catalog.delete_by_id(&id).unwrap());
        assert!(!catalog.delete_by_id(&id).unwrap());
        assert!(catalog.find_by_id(&id).unwrap().is_none());
        assert!(!catalog.delete_by_id("not-an-id").unwrap());
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let record = catalog(&temp)
            .insert(new_book("Don Quijote", "Cervantes"))
            .unwrap();

        let reopened = catalog(&temp);
        assert_eq!(reopened.find_all().unwrap(), vec![record]);
    }
}
