//! Journal file header
//!
//! Every journal file begins with a fixed header identifying the resource.
//!
//! Layout:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HEADER (64 bytes)                       │
//! │   magic: [u8; 4] = "JRNL"               │
//! │   version: u16                          │
//! │   uuid: [u8; 16]                        │
//! │   create_time: i64                      │
//! │   commit_time: i64                      │
//! │   kind: u8                              │
//! │   reserved: [u8; 21]                    │
//! │   checksum: u32                         │
//! └─────────────────────────────────────────┘
//! ```
//! Multi-byte fields are little-endian. The checksum is CRC32 of bytes 0..60.

use crate::descriptor::{JournalDescriptor, ResourceKind};
use crate::error::{IndexError, IndexResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

/// Magic bytes for journal file identification
const JOURNAL_MAGIC: [u8; 4] = *b"JRNL";

/// Current journal header version
const JOURNAL_VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 64;

impl TryFrom<u8> for ResourceKind {
    type Error = IndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResourceKind::Journal),
            1 => Ok(ResourceKind::IndexSegment),
            _ => Err(IndexError::InvalidJournal(format!(
                "Unknown resource kind: {}",
                value
            ))),
        }
    }
}

impl From<ResourceKind> for u8 {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Journal => 0,
            ResourceKind::IndexSegment => 1,
        }
    }
}

/// Parsed journal header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalHeader {
    pub uuid: Uuid,
    pub create_time: i64,
    pub commit_time: i64,
    pub kind: ResourceKind,
}

impl JournalHeader {
    /// Header for a new live journal
    pub fn new(create_time: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            create_time,
            commit_time: 0,
            kind: ResourceKind::Journal,
        }
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..4].copy_from_slice(&JOURNAL_MAGIC);
        buf[4..6].copy_from_slice(&JOURNAL_VERSION.to_le_bytes());
        buf[6..22].copy_from_slice(self.uuid.as_bytes());
        buf[22..30].copy_from_slice(&self.create_time.to_le_bytes());
        buf[30..38].copy_from_slice(&self.commit_time.to_le_bytes());
        buf[38] = self.kind.into();
        // bytes 39-59 reserved

        let checksum = crc32fast::hash(&buf[0..60]);
        buf[60..64].copy_from_slice(&checksum.to_le_bytes());

        buf
    }

    /// Parse header from bytes
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> IndexResult<Self> {
        // Verify checksum first
        let stored_checksum = u32::from_le_bytes([buf[60], buf[61], buf[62], buf[63]]);
        let computed_checksum = crc32fast::hash(&buf[0..60]);

        if stored_checksum != computed_checksum {
            return Err(IndexError::Corruption(format!(
                "Journal header checksum mismatch: stored={}, computed={}",
                stored_checksum, computed_checksum
            )));
        }

        if buf[0..4] != JOURNAL_MAGIC {
            return Err(IndexError::InvalidJournal(format!(
                "Invalid magic: {:?}",
                &buf[0..4]
            )));
        }

        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version == 0 || version > JOURNAL_VERSION {
            return Err(IndexError::InvalidJournal(format!(
                "Unsupported version: {}",
                version
            )));
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&buf[6..22]);

        let mut create_time = [0u8; 8];
        create_time.copy_from_slice(&buf[22..30]);

        let create_time = i64::from_le_bytes(create_time);
        if create_time <= 0 {
            return Err(IndexError::InvalidJournal(format!(
                "createTime must be positive, got {}",
                create_time
            )));
        }

        let mut commit_time = [0u8; 8];
        commit_time.copy_from_slice(&buf[30..38]);

        Ok(Self {
            uuid: Uuid::from_bytes(uuid),
            create_time,
            commit_time: i64::from_le_bytes(commit_time),
            kind: ResourceKind::try_from(buf[38])?,
        })
    }

    /// Read the header at the start of a file
    pub fn read_from(path: &Path) -> IndexResult<Self> {
        let mut file = File::open(path)?;
        let mut buf = [0u8; HEADER_SIZE];

        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                IndexError::InvalidJournal(format!("{:?} is shorter than a header", path))
            } else {
                IndexError::Io(e)
            }
        })?;

        Self::from_bytes(&buf)
    }

    /// Build the descriptor for the file this header came from
    pub fn to_descriptor(&self, file: &Path, size: u64) -> JournalDescriptor {
        JournalDescriptor::new(file, self.create_time)
            .uuid(self.uuid)
            .size(size)
            .commit_time(self.commit_time)
            .kind(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_roundtrip() {
        let header = JournalHeader {
            uuid: Uuid::new_v4(),
            create_time: 1_700_000_000_000,
            commit_time: 1_700_000_500_000,
            kind: ResourceKind::IndexSegment,
        };

        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"JRNL");
        assert_eq!(JournalHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut bytes = JournalHeader::new(100).to_bytes();
        bytes[25] ^= 0x01;

        assert!(matches!(
            JournalHeader::from_bytes(&bytes),
            Err(IndexError::Corruption(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = JournalHeader::new(100).to_bytes();
        bytes[0..4].copy_from_slice(b"CHRN");
        let checksum = crc32fast::hash(&bytes[0..60]);
        bytes[60..64].copy_from_slice(&checksum.to_le_bytes());

        assert!(matches!(
            JournalHeader::from_bytes(&bytes),
            Err(IndexError::InvalidJournal(_))
        ));
    }

    /// Rewrite a header field and fix up the checksum
    fn patched(header: &JournalHeader, offset: usize, bytes: &[u8]) -> [u8; HEADER_SIZE] {
        let mut buf = header.to_bytes();
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        let checksum = crc32fast::hash(&buf[0..60]);
        buf[60..64].copy_from_slice(&checksum.to_le_bytes());
        buf
    }

    #[test]
    fn test_rejects_unwritten_versions() {
        let header = JournalHeader::new(100);

        for version in [0u16, JOURNAL_VERSION + 1] {
            let bytes = patched(&header, 4, &version.to_le_bytes());
            assert!(
                matches!(
                    JournalHeader::from_bytes(&bytes),
                    Err(IndexError::InvalidJournal(_))
                ),
                "version {} should be rejected",
                version
            );
        }
    }

    #[test]
    fn test_rejects_non_positive_create_time() {
        for create_time in [0i64, -1, i64::MIN] {
            let mut header = JournalHeader::new(1);
            header.create_time = create_time;

            assert!(matches!(
                JournalHeader::from_bytes(&header.to_bytes()),
                Err(IndexError::InvalidJournal(_))
            ));
        }
    }

    #[test]
    fn test_read_short_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.jnl");
        std::fs::write(&path, b"JRNL").unwrap();

        assert!(matches!(
            JournalHeader::read_from(&path),
            Err(IndexError::InvalidJournal(_))
        ));
    }

    #[test]
    fn test_to_descriptor() {
        let header = JournalHeader::new(42);
        let desc = header.to_descriptor(Path::new("/j/42.jnl"), 128);

        assert_eq!(desc.uuid, header.uuid);
        assert_eq!(desc.create_time, 42);
        assert_eq!(desc.size, 128);
        assert!(desc.is_journal());
    }
}
