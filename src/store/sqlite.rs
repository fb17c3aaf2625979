//! SQLite-backed ordered store
//!
//! Uses SQLite's built-in B-tree. Keys are stored as BLOBs in a
//! `WITHOUT ROWID` table, which SQLite orders with memcmp, so ascending
//! primary-key order is byte-lexicographic key order.
//!
//! # Performance
//! - Insert / contains: O(log n)
//! - Position search: O(log n + p) where p = entries before the key

use crate::error::{IndexError, IndexResult};
use crate::store::{OrderedStore, Position, SearchResult};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS journal_index (
    key BLOB PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
) WITHOUT ROWID";

/// Ordered store kept in a SQLite table
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a store file, keeping whatever it already holds
    pub fn open(path: &Path) -> IndexResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        conn.execute(SCHEMA, [])?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a store file and discard previous entries
    ///
    /// The index is rebuilt from the journal directory on every start, so
    /// stale rows from an earlier process must not survive.
    pub fn create(path: &Path) -> IndexResult<Self> {
        let store = Self::open(path)?;
        let removed = store.conn.execute("DELETE FROM journal_index", [])?;
        if removed > 0 {
            tracing::debug!("Discarded {} stale entries from {:?}", removed, path);
        }
        Ok(store)
    }

    /// Private in-memory database
    pub fn in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn, path: None })
    }

    /// Get the database file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn column_at(&self, column: &str, position: Position) -> IndexResult<Vec<u8>> {
        let sql = format!(
            "SELECT {} FROM journal_index ORDER BY key ASC LIMIT 1 OFFSET ?",
            column
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;

        stmt.query_row(params![position as i64], |row| row.get::<_, Vec<u8>>(0))
            .optional()?
            .ok_or_else(|| {
                IndexError::InvalidArgument(format!("Position {} out of range", position))
            })
    }
}

impl OrderedStore for SqliteStore {
    fn contains(&self, key: &[u8]) -> IndexResult<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM journal_index WHERE key = ?")?;
        Ok(stmt.exists(params![key])?)
    }

    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> IndexResult<()> {
        // Plain INSERT: the primary key constraint rejects duplicates
        self.conn.execute(
            "INSERT INTO journal_index (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn search(&self, key: &[u8]) -> IndexResult<SearchResult> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM journal_index WHERE key < ?")?;
        let before: i64 = stmt.query_row(params![key], |row| row.get(0))?;
        let position = before as Position;

        if self.contains(key)? {
            Ok(SearchResult::ExactMatch(position))
        } else {
            Ok(SearchResult::InsertionPoint(position))
        }
    }

    fn value_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        self.column_at("value", position)
    }

    fn key_at(&self, position: Position) -> IndexResult<Vec<u8>> {
        self.column_at("key", position)
    }

    fn len(&self) -> IndexResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM journal_index", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_ordering() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert(&[0, 0, 3], b"c".to_vec()).unwrap();
        store.insert(&[0, 0, 1], b"a".to_vec()).unwrap();
        store.insert(&[0, 0, 2], b"b".to_vec()).unwrap();

        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.value_at(0).unwrap(), b"a");
        assert_eq!(store.value_at(2).unwrap(), b"c");
        assert_eq!(store.key_at(1).unwrap(), vec![0, 0, 2]);
        assert!(store.path().is_none());
    }

    #[test]
    fn test_search_positions() {
        let mut store = SqliteStore::in_memory().unwrap();
        for k in [10u8, 20, 30] {
            store.insert(&[k], vec![k]).unwrap();
        }

        assert_eq!(store.search(&[20]).unwrap(), SearchResult::ExactMatch(1));
        assert_eq!(store.search(&[25]).unwrap(), SearchResult::InsertionPoint(2));
        assert_eq!(store.search(&[5]).unwrap(), SearchResult::InsertionPoint(0));
        assert_eq!(store.search(&[40]).unwrap(), SearchResult::InsertionPoint(3));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.insert(&[1], b"first".to_vec()).unwrap();

        let err = store.insert(&[1], b"second".to_vec()).unwrap_err();
        assert!(matches!(err, IndexError::Store(_)));
        assert_eq!(store.value_at(0).unwrap(), b"first");
    }

    #[test]
    fn test_out_of_range_position() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            store.value_at(0),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_discards_previous_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index").join("journal_index.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.insert(&[1], b"a".to_vec()).unwrap();
            store.insert(&[2], b"b".to_vec()).unwrap();
        }

        // Reopen keeps entries
        {
            let store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.len().unwrap(), 2);
            assert_eq!(store.path(), Some(path.as_path()));
        }

        // Create starts over
        let store = SqliteStore::create(&path).unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }
}
