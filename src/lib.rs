//! # Journal Index
//!
//! Temporal index from commit timestamps to the journal resource that was
//! current at that time. A transaction starting at time T reads from the
//! journal with the greatest create time <= T.
//!
//! ## Modules
//!
//! - [`index`]: key encoding and the floor-searching [`TemporalIndex`]
//! - [`store`]: ordered key/value stores the index is built on
//! - [`descriptor`]: journal descriptors and their codecs
//! - [`journal`]: journal file headers and directory scanning
//! - [`manager`]: session-level owner that rebuilds the index from disk
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use journal_index::{JournalDescriptor, TemporalIndex};
//!
//! fn main() -> Result<(), journal_index::IndexError> {
//!     let index = TemporalIndex::<JournalDescriptor>::in_memory();
//!
//!     index.add(&JournalDescriptor::new("100.jnl", 100))?;
//!     index.add(&JournalDescriptor::new("200.jnl", 200))?;
//!
//!     // Journal current at time 150
//!     let journal = index.find(150)?.expect("journal 100 covers 150");
//!     assert_eq!(journal.create_time, 100);
//!
//!     // Nothing existed yet at time 50
//!     assert!(index.find(50)?.is_none());
//!
//!     index.close()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod index;
pub mod journal;
pub mod manager;
pub mod store;

pub use config::{Config, ConfigError, IndexConfig, JournalConfig, LoggingConfig, StoreBackend};
pub use descriptor::{
    BincodeCodec, CodecKind, DescriptorCodec, JournalDescriptor, JsonCodec, ResourceDescriptor,
    ResourceKind,
};
pub use error::{IndexError, IndexResult};
pub use index::TemporalIndex;
pub use journal::{JournalHeader, JournalScanner};
pub use manager::{IndexStats, JournalIndex, ResourceManager};
pub use store::{MemoryStore, OrderedStore, Position, SearchResult, SqliteStore};
