//! Temporal Index - maps commit timestamps to resource descriptors
//!
//! Answers "which resource was current at or before time T?". Entries are
//! keyed by the descriptor's create time and kept in an ordered store; a
//! lookup is a floor search over that store.
//!
//! # Floor search
//!
//! ```text
//! entries:    100   200   300
//! position:    0     1     2
//!
//! find(300) -> exact match at 2          -> entry 300
//! find(250) -> insertion point 2, 2 - 1  -> entry 200
//! find(50)  -> insertion point 0         -> none
//! ```
//!
//! # Concurrency
//!
//! Every operation holds one exclusive lock for its whole duration, so a
//! position obtained by a search is still valid when its value is read.
//! Closing takes the same lock, which makes it wait for in-flight calls.

use crate::descriptor::{BincodeCodec, DescriptorCodec, ResourceDescriptor};
use crate::error::{IndexError, IndexResult};
use crate::index::key;
use crate::store::{MemoryStore, OrderedStore, Position, SearchResult};
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

/// Ordered index of resource descriptors by create time
///
/// Entries are immutable once added: there is no update or delete.
pub struct TemporalIndex<D, S = MemoryStore, C = BincodeCodec> {
    /// `None` once the index has been closed
    store: Mutex<Option<S>>,
    codec: C,
    _descriptor: PhantomData<fn() -> D>,
}

impl<D, S, C> TemporalIndex<D, S, C>
where
    D: ResourceDescriptor,
    S: OrderedStore,
    C: DescriptorCodec<D>,
{
    /// Create an index over an existing store
    pub fn new(store: S, codec: C) -> Self {
        Self {
            store: Mutex::new(Some(store)),
            codec,
            _descriptor: PhantomData,
        }
    }

    // ==================== Write Methods ====================

    /// Add a descriptor under its create time
    ///
    /// Fails with `InvalidArgument` if the create time is not positive and
    /// with `DuplicateKey` if an entry already exists for it. The index is
    /// unchanged on failure.
    pub fn add(&self, descriptor: &D) -> IndexResult<()> {
        let mut guard = self.lock()?;
        let store = guard.as_mut().ok_or(IndexError::Closed)?;
        Self::insert_entry(store, &self.codec, descriptor)
    }

    /// Add a batch of descriptors in any order
    ///
    /// Stops at the first failure and returns it; descriptors added before
    /// the failure stay in the index. Returns the number added.
    pub fn load<'a, I>(&self, descriptors: I) -> IndexResult<usize>
    where
        I: IntoIterator<Item = &'a D>,
        D: 'a,
    {
        let mut guard = self.lock()?;
        let store = guard.as_mut().ok_or(IndexError::Closed)?;

        let mut loaded = 0;
        for descriptor in descriptors {
            Self::insert_entry(store, &self.codec, descriptor)?;
            loaded += 1;
        }

        tracing::debug!("Loaded {} entries into temporal index", loaded);
        Ok(loaded)
    }

    fn insert_entry(store: &mut S, codec: &C, descriptor: &D) -> IndexResult<()> {
        let create_time = descriptor.create_time();
        check_timestamp(create_time, "createTime")?;

        let key = key::encode(create_time);
        if store.contains(&key)? {
            return Err(IndexError::DuplicateKey { create_time });
        }

        let value = codec.serialize(descriptor)?;
        if value.is_empty() {
            return Err(IndexError::Serialization(format!(
                "Codec produced no bytes for createTime={}",
                create_time
            )));
        }

        store.insert(&key, value)?;
        tracing::debug!("Indexed resource createTime={}", create_time);
        Ok(())
    }

    // ==================== Query Methods ====================

    /// Find the descriptor with the greatest create time <= `timestamp`
    ///
    /// Returns `None` if the index is empty or every entry is newer.
    pub fn find(&self, timestamp: i64) -> IndexResult<Option<D>> {
        check_timestamp(timestamp, "timestamp")?;

        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;

        match Self::floor_position(store, timestamp)? {
            Some(position) => self.decode_at(store, position).map(Some),
            None => Ok(None),
        }
    }

    /// [`TemporalIndex::find`] together with the entry's position
    ///
    /// Both come from the same locked read of the store.
    pub fn find_with_position(&self, timestamp: i64) -> IndexResult<Option<(Position, D)>> {
        check_timestamp(timestamp, "timestamp")?;

        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;

        match Self::floor_position(store, timestamp)? {
            Some(position) => Ok(Some((position, self.decode_at(store, position)?))),
            None => Ok(None),
        }
    }

    /// Position of the entry [`TemporalIndex::find`] would return
    pub fn find_index_of(&self, timestamp: i64) -> IndexResult<Option<Position>> {
        check_timestamp(timestamp, "timestamp")?;

        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;
        Self::floor_position(store, timestamp)
    }

    fn floor_position(store: &S, timestamp: i64) -> IndexResult<Option<Position>> {
        Ok(match store.search(&key::encode(timestamp))? {
            SearchResult::ExactMatch(position) => Some(position),
            // Nothing sorts before the timestamp
            SearchResult::InsertionPoint(0) => None,
            SearchResult::InsertionPoint(position) => Some(position - 1),
        })
    }

    /// Exact-match existence test
    pub fn contains(&self, create_time: i64) -> IndexResult<bool> {
        check_timestamp(create_time, "createTime")?;

        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;
        store.contains(&key::encode(create_time))
    }

    /// Descriptor registered under exactly `create_time`
    pub fn get(&self, create_time: i64) -> IndexResult<Option<D>> {
        check_timestamp(create_time, "createTime")?;

        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;

        match store.search(&key::encode(create_time))? {
            SearchResult::ExactMatch(position) => self.decode_at(store, position).map(Some),
            SearchResult::InsertionPoint(_) => Ok(None),
        }
    }

    /// Descriptor at an ordinal position
    pub fn descriptor_at(&self, position: Position) -> IndexResult<D> {
        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;
        Self::check_position(store, position)?;
        self.decode_at(store, position)
    }

    /// Create time at an ordinal position, without decoding the descriptor
    pub fn create_time_at(&self, position: Position) -> IndexResult<i64> {
        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;
        Self::check_position(store, position)?;
        key::decode_slice(&store.key_at(position)?)
    }

    /// All descriptors in ascending create time order
    pub fn entries(&self) -> IndexResult<Vec<D>> {
        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;

        (0..store.len()?)
            .map(|position| self.decode_at(store, position))
            .collect()
    }

    /// Earliest and latest create times, if any
    pub fn time_bounds(&self) -> IndexResult<Option<(i64, i64)>> {
        let guard = self.lock()?;
        let store = guard.as_ref().ok_or(IndexError::Closed)?;

        let len = store.len()?;
        if len == 0 {
            return Ok(None);
        }

        let first = key::decode_slice(&store.key_at(0)?)?;
        let last = key::decode_slice(&store.key_at(len - 1)?)?;
        Ok(Some((first, last)))
    }

    /// Number of entries
    pub fn len(&self) -> IndexResult<usize> {
        let guard = self.lock()?;
        guard.as_ref().ok_or(IndexError::Closed)?.len()
    }

    pub fn is_empty(&self) -> IndexResult<bool> {
        Ok(self.len()? == 0)
    }

    fn decode_at(&self, store: &S, position: Position) -> IndexResult<D> {
        let bytes = store.value_at(position)?;
        self.codec.deserialize(&bytes)
    }

    fn check_position(store: &S, position: Position) -> IndexResult<()> {
        let len = store.len()?;
        if position >= len {
            return Err(IndexError::InvalidArgument(format!(
                "Position {} out of range (len={})",
                position, len
            )));
        }
        Ok(())
    }
}

impl<D, S, C> TemporalIndex<D, S, C> {
    /// Release the store; every later call fails with `Closed`
    ///
    /// Waits for any operation currently holding the lock. Closing an
    /// already closed index does nothing.
    pub fn close(&self) -> IndexResult<()> {
        let mut guard = self.lock()?;
        if guard.take().is_some() {
            tracing::debug!("Temporal index closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Option<S>>> {
        self.store
            .lock()
            .map_err(|e| IndexError::Lock(format!("Temporal index lock poisoned: {}", e)))
    }
}

impl<D> TemporalIndex<D, MemoryStore, BincodeCodec>
where
    D: ResourceDescriptor + serde::Serialize + serde::de::DeserializeOwned,
{
    /// Empty in-memory index using the bincode codec
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), BincodeCodec)
    }
}

fn check_timestamp(value: i64, name: &str) -> IndexResult<()> {
    if value <= 0 {
        return Err(IndexError::InvalidArgument(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}
