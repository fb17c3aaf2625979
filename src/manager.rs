//! Resource Manager - owns the journal index for a session
//!
//! Builds the temporal index from the journal directory at startup and
//! answers which journal was current at a given time.
//!
//! ```text
//! open:  JournalScanner::scan → [descriptors] → TemporalIndex::load
//! find:  timestamp → TemporalIndex::find → JournalDescriptor
//! ```

use crate::config::{Config, StoreBackend};
use crate::descriptor::{CodecKind, JournalDescriptor};
use crate::error::{IndexError, IndexResult};
use crate::index::TemporalIndex;
use crate::journal::JournalScanner;
use crate::store::{MemoryStore, OrderedStore, Position, SqliteStore};
use std::path::Path;

/// Store selected at runtime from configuration
pub type DynStore = Box<dyn OrderedStore + Send>;

/// Temporal index over journal descriptors
pub type JournalIndex = TemporalIndex<JournalDescriptor, DynStore, CodecKind>;

/// Summary of the indexed journals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of indexed journals
    pub entries: usize,
    /// Create time of the oldest journal
    pub first_create_time: Option<i64>,
    /// Create time of the newest journal
    pub last_create_time: Option<i64>,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.first_create_time, self.last_create_time) {
            (Some(first), Some(last)) => write!(
                f,
                "{} journals, createTime {}..={}",
                self.entries, first, last
            ),
            _ => write!(f, "{} journals", self.entries),
        }
    }
}

/// Coordinates journal discovery and the temporal index
pub struct ResourceManager {
    scanner: JournalScanner,
    index: JournalIndex,
}

impl ResourceManager {
    /// Build the index described by `config` and populate it from disk
    pub fn open(config: &Config) -> IndexResult<Self> {
        let store: DynStore = match config.index.backend {
            StoreBackend::Memory => Box::new(MemoryStore::new()),
            StoreBackend::Sqlite => Box::new(SqliteStore::create(Path::new(
                &config.index.sqlite_path,
            ))?),
        };

        Self::with_store(
            JournalScanner::from_config(&config.journal),
            store,
            config.index.codec,
        )
    }

    /// Populate a fresh index over `store` from `scanner`
    pub fn with_store(
        scanner: JournalScanner,
        store: DynStore,
        codec: CodecKind,
    ) -> IndexResult<Self> {
        if !store.is_empty()? {
            return Err(IndexError::InvalidArgument(
                "Journal index must be built over an empty store".to_string(),
            ));
        }

        let index = TemporalIndex::new(store, codec);
        let journals = scanner.scan()?;
        let loaded = index.load(&journals)?;

        tracing::info!("Journal index ready: {} journals from {:?}", loaded, scanner.dir());
        Ok(Self { scanner, index })
    }

    /// Index journals created since the last scan
    ///
    /// Returns the number of newly indexed journals.
    pub fn refresh(&self) -> IndexResult<usize> {
        let mut added = 0;

        for journal in self.scanner.scan()? {
            match self.index.add(&journal) {
                Ok(()) => added += 1,
                Err(IndexError::DuplicateKey { create_time }) => {
                    if let Some(existing) = self.index.get(create_time)? {
                        if existing.uuid != journal.uuid {
                            tracing::warn!(
                                "Journal {:?} shares createTime={} with {:?}; keeping the indexed one",
                                journal.file,
                                create_time,
                                existing.file
                            );
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if added > 0 {
            tracing::info!("Indexed {} new journals", added);
        }
        Ok(added)
    }

    /// Create a new journal file and index it
    pub fn create_journal(&self, create_time: i64) -> IndexResult<JournalDescriptor> {
        let journal = self.scanner.create(create_time)?;
        self.index.add(&journal)?;
        Ok(journal)
    }

    /// Journal that was current at `timestamp`
    pub fn find(&self, timestamp: i64) -> IndexResult<Option<JournalDescriptor>> {
        self.index.find(timestamp)
    }

    /// Position of the journal that was current at `timestamp`
    pub fn find_index_of(&self, timestamp: i64) -> IndexResult<Option<Position>> {
        self.index.find_index_of(timestamp)
    }

    /// Journal current at `timestamp` together with its position
    pub fn find_with_position(
        &self,
        timestamp: i64,
    ) -> IndexResult<Option<(Position, JournalDescriptor)>> {
        self.index.find_with_position(timestamp)
    }

    /// All journals in ascending create time order
    pub fn entries(&self) -> IndexResult<Vec<JournalDescriptor>> {
        self.index.entries()
    }

    pub fn stats(&self) -> IndexResult<IndexStats> {
        let bounds = self.index.time_bounds()?;
        Ok(IndexStats {
            entries: self.index.len()?,
            first_create_time: bounds.map(|(first, _)| first),
            last_create_time: bounds.map(|(_, last)| last),
        })
    }

    /// Underlying temporal index
    pub fn index(&self) -> &JournalIndex {
        &self.index
    }

    /// Close the index; later lookups fail with `Closed`
    pub fn shutdown(&self) -> IndexResult<()> {
        tracing::info!("Shutting down journal index");
        self.index.close()
    }
}
