use super::{sort_records, BookRecord, CatalogRepository, NewBook};
use crate::BookResult;
use bibliotek_uuid::CanonicalId;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process catalog. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: RwLock<HashMap<String, BookRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, BookRecord>> {
        self.records.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, BookRecord>> {
        self.records.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl CatalogRepository for MemoryCatalog {
    fn find_all(&self) -> BookResult<Vec<BookRecord>> {
        let mut records: Vec<_> = self.read().values().cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn find_by_id(&self, id: &str) -> BookResult<Option<BookRecord>> {
        Ok(self.read().get(id).cloned())
    }

    fn exists_by_title_and_author(&self, title: &str, author: &str) -> BookResult<bool> {
        Ok(self
            .read()
            .values()
            .any(|book| book.has_title_and_author(title, author)))
    }

    fn insert(&self, book: NewBook) -> BookResult<BookRecord> {
        let mut records = self.write();

        if records
            .values()
            .any(|r| r.has_title_and_author(book.title.as_str(), book.author.as_str()))
        {
            return Err(book.duplicate_error());
        }

        let mut id = CanonicalId::new();
        while records.contains_key(&id.to_string()) {
            id = CanonicalId::new();
        }

        let record = book.into_record(id, Utc::now());
        records.insert(record.id.to_string(), record.clone());
        Ok(record)
    }

    fn delete_by_id(&self, id: &str) -> BookResult<bool> {
        Ok(self.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::new_book;
    use super::*;
    use crate::BookError;

    #[test]
    fn test_insert_find_delete() {
        let catalog = MemoryCatalog::new();

        let record = catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();
        let id = record.id.to_string();

        assert_eq!(catalog.find_by_id(&id).unwrap(), Some(record));
        assert!(catalog.delete_by_id(&id).unwrap());
        assert!(!catalog.delete_by_id(&id).unwrap());
        assert!(catalog.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let catalog = MemoryCatalog::new();

        catalog.insert(new_book("Don Quijote", "Cervantes")).unwrap();
        let result = catalog.insert(new_book("don quijote", "CERVANTES"));

        assert!(matches!(result, Err(BookError::DuplicateEntry { .. })));
    }

    #[test]
    fn test_find_all_is_oldest_first() {
        let catalog = MemoryCatalog::new();

        let first = catalog.insert(new_book("A", "X")).unwrap();
        let second = catalog.insert(new_book("B", "X")).unwrap();
        let third = catalog.insert(new_book("C", "X")).unwrap();

        let all = catalog.find_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at <= all[1].created_at);
        assert!(all[1].created_at <= all[2].created_at);
        for record in [first, second, third] {
            assert!(all.contains(&record));
        }
    }
}
