//! Ordered key/value stores
//!
//! The temporal index keeps its entries in an ordered store addressed by
//! byte keys. Two implementations are provided:
//!
//! - **MemoryStore**: sorted vector with binary search, used by default and in tests
//! - **SqliteStore**: SQLite B-tree table, for indexes too large to keep in memory
//!
//! # Positions
//!
//! Every entry has an ordinal position in ascending key order. A search
//! either lands on an existing entry or reports where the key would go:
//!
//! ```text
//! keys:      [100] [200] [300]
//! position:    0     1     2
//!
//! search(200) -> ExactMatch(1)
//! search(250) -> InsertionPoint(2)
//! search(50)  -> InsertionPoint(0)
//! search(400) -> InsertionPoint(3)
//! ```

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::IndexResult;

/// Ordinal position of an entry in ascending key order
pub type Position = usize;

/// Outcome of an ordered-position search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// The key is stored at this position
    ExactMatch(Position),
    /// The key is absent and would be inserted at this position
    InsertionPoint(Position),
}

/// Sorted key → bytes index consumed by the temporal index
///
/// Keys compare byte-lexicographically. Implementations must not overwrite
/// an existing key on insert.
pub trait OrderedStore {
    /// Exact-match existence test
    fn contains(&self, key: &[u8]) -> IndexResult<bool>;

    /// Insert a new entry; fails if the key is already present
    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> IndexResult<()>;

    /// Locate a key by ordinal position
    fn search(&self, key: &[u8]) -> IndexResult<SearchResult>;

    /// Raw value bytes at a position
    fn value_at(&self, position: Position) -> IndexResult<Vec<u8>>;

    /// Raw key bytes at a position
    fn key_at(&self, position: Position) -> IndexResult<Vec<u8>>;

    /// Number of entries
    fn len(&self) -> IndexResult<usize>;

    fn is_empty(&self) -> IndexResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S: OrderedStore + ?Sized> OrderedStore for Box<S> {
    fn contains(&self, key: &[u8]) -> IndexResult<bool> {
        (**self).contains(key)
    }

    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> IndexResult<()> {
        (**self).insert(key, value)
    }

    fn search(&self, key: &[u8]) -> IndexResult<SearchResult> {
        (**self).search(key)
    }

    fn value_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        (**self).value_at(position)
    }

    fn key_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        (**self).key_at(position)
    }

    fn len(&self) -> IndexResult<usize> {
        (**self).len()
    }
}
