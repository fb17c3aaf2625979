//! Temporal index structures
//!
//! - **key**: order-preserving encoding of timestamps into 8-byte keys
//! - **TemporalIndex**: floor search from a timestamp to the resource
//!   that was current at that time
//!
//! # Architecture
//!
//! ```text
//! add:   descriptor → key::encode(createTime) + codec.serialize → OrderedStore::insert
//!
//! find:  timestamp → key::encode → OrderedStore::search → position
//!                  → OrderedStore::value_at → codec.deserialize → descriptor
//! ```

pub mod key;
mod temporal;

pub use temporal::TemporalIndex;
