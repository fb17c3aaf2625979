//! Resource descriptors
//!
//! A descriptor identifies a physical storage resource and the time it was
//! created. The index only depends on [`ResourceDescriptor::create_time`];
//! everything else is payload carried through a [`DescriptorCodec`].
//!
//! - `JournalDescriptor`: descriptor for journal files and index segments
//! - `codec`: pluggable serialization of descriptors

mod codec;

pub use codec::{BincodeCodec, CodecKind, DescriptorCodec, JsonCodec};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Anything the temporal index can hold
pub trait ResourceDescriptor {
    /// Creation time in milliseconds; strictly positive and unique per index
    fn create_time(&self) -> i64;
}

/// Kind of physical resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Append-only journal receiving writes
    Journal,
    /// Read-only index segment built from a journal
    IndexSegment,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Journal => write!(f, "journal"),
            ResourceKind::IndexSegment => write!(f, "index_segment"),
        }
    }
}

/// Metadata describing one journal resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalDescriptor {
    /// Unique resource identifier
    pub uuid: Uuid,
    /// Location of the backing file
    pub file: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Unix timestamp in milliseconds at which the resource was created
    pub create_time: i64,
    /// Timestamp of the last commit, 0 while the journal is still live
    #[serde(default)]
    pub commit_time: i64,
    pub kind: ResourceKind,
}

impl JournalDescriptor {
    /// Create a journal descriptor with a fresh UUID
    pub fn new(file: impl Into<PathBuf>, create_time: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            file: file.into(),
            size: 0,
            create_time,
            commit_time: 0,
            kind: ResourceKind::Journal,
        }
    }

    /// Builder method: set the UUID
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// Builder method: set the file size
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Builder method: set the last commit time
    pub fn commit_time(mut self, commit_time: i64) -> Self {
        self.commit_time = commit_time;
        self
    }

    /// Builder method: set the resource kind
    pub fn kind(mut self, kind: ResourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_journal(&self) -> bool {
        self.kind == ResourceKind::Journal
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether the journal has been closed for writes
    pub fn is_committed(&self) -> bool {
        self.commit_time > 0
    }
}

impl ResourceDescriptor for JournalDescriptor {
    fn create_time(&self) -> i64 {
        self.create_time
    }
}

impl std::fmt::Display for JournalDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{{uuid={}, file={:?}, size={}, createTime={}, commitTime={}}}",
            self.kind,
            self.uuid,
            self.file,
            self.size,
            self.create_time,
            self.commit_time
        )
    }
}
