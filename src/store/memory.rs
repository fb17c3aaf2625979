//! In-memory ordered store backed by a sorted vector
//!
//! Entries stay sorted by key, so positions are plain vector indices.
//!
//! # Performance
//! - Search: O(log n)
//! - Insert: O(n) worst case (shift), fine for the few hundred journals
//!   a resource manager tracks

use crate::error::{IndexError, IndexResult};
use crate::store::{OrderedStore, Position, SearchResult};

/// Sorted vector of (key, value) pairs
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn locate(&self, key: &[u8]) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(existing, _)| existing.as_slice().cmp(key))
    }

    fn entry(&self, position: Position) -> IndexResult<&(Vec<u8>, Vec<u8>)> {
        self.entries.get(position).ok_or_else(|| {
            IndexError::InvalidArgument(format!(
                "Position {} out of range (len={})",
                position,
                self.entries.len()
            ))
        })
    }
}

impl OrderedStore for MemoryStore {
    fn contains(&self, key: &[u8]) -> IndexResult<bool> {
        Ok(self.locate(key).is_ok())
    }

    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> IndexResult<()> {
        match self.locate(key) {
            Ok(pos) => Err(IndexError::Store(format!(
                "Key already present at position {}",
                pos
            ))),
            Err(pos) => {
                self.entries.insert(pos, (key.to_vec(), value));
                Ok(())
            }
        }
    }

    fn search(&self, key: &[u8]) -> IndexResult<SearchResult> {
        Ok(match self.locate(key) {
            Ok(pos) => SearchResult::ExactMatch(pos),
            Err(pos) => SearchResult::InsertionPoint(pos),
        })
    }

    fn value_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        self.entry(position).map(|(_, value)| value.clone())
    }

    fn key_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        self.entry(position).map(|(key, _)| key.clone())
    }

    fn len(&self) -> IndexResult<usize> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> MemoryStore {
        let mut store = MemoryStore::new();
        // Insert out of order
        store.insert(&[0, 3], b"c".to_vec()).unwrap();
        store.insert(&[0, 1], b"a".to_vec()).unwrap();
        store.insert(&[0, 2], b"b".to_vec()).unwrap();
        store
    }

    #[test]
    fn test_entries_kept_sorted() {
        let store = populated();
        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.value_at(0).unwrap(), b"a");
        assert_eq!(store.value_at(1).unwrap(), b"b");
        assert_eq!(store.value_at(2).unwrap(), b"c");
        assert_eq!(store.key_at(2).unwrap(), vec![0, 3]);
    }

    #[test]
    fn test_search_positions() {
        let store = populated();
        assert_eq!(store.search(&[0, 2]).unwrap(), SearchResult::ExactMatch(1));
        assert_eq!(store.search(&[0, 0]).unwrap(), SearchResult::InsertionPoint(0));
        assert_eq!(store.search(&[0, 2, 5]).unwrap(), SearchResult::InsertionPoint(2));
        assert_eq!(store.search(&[1]).unwrap(), SearchResult::InsertionPoint(3));
    }

    #[test]
    fn test_insert_does_not_overwrite() {
        let mut store = populated();
        let err = store.insert(&[0, 2], b"z".to_vec()).unwrap_err();
        assert!(matches!(err, IndexError::Store(_)));
        assert_eq!(store.value_at(1).unwrap(), b"b");
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_contains_and_bounds() {
        let store = populated();
        assert!(store.contains(&[0, 1]).unwrap());
        assert!(!store.contains(&[0, 4]).unwrap());
        assert!(matches!(
            store.value_at(3),
            Err(IndexError::InvalidArgument(_))
        ));
        assert!(MemoryStore::with_capacity(8).is_empty().unwrap());
    }
}
