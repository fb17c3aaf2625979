//! Descriptor serialization
//!
//! Codecs turn descriptors into the opaque value bytes held by the ordered
//! store and back. Decoding never yields a partially populated descriptor:
//! malformed input is reported as [`IndexError::Corruption`].
//!
//! Bincode frame layout:
//! ```text
//! ┌─────────┬──────────────────────┬───────────┐
//! │ version │ bincode payload      │ crc32     │
//! │ u8      │ [u8; N]              │ u32 (LE)  │
//! └─────────┴──────────────────────┴───────────┘
//! ```
//! The CRC covers version and payload.

use crate::error::{IndexError, IndexResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Current bincode frame version
const FRAME_VERSION: u8 = 1;

/// Version byte + trailing CRC
const FRAME_OVERHEAD: usize = 1 + 4;

/// Serialize and deserialize descriptors of type `D`
pub trait DescriptorCodec<D> {
    /// Encode a descriptor; output is never empty
    fn serialize(&self, descriptor: &D) -> IndexResult<Vec<u8>>;

    /// Decode bytes produced by [`DescriptorCodec::serialize`]
    fn deserialize(&self, bytes: &[u8]) -> IndexResult<D>;
}

/// Compact checksummed binary encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BincodeCodec;

impl<D> DescriptorCodec<D> for BincodeCodec
where
    D: Serialize + DeserializeOwned,
{
    fn serialize(&self, descriptor: &D) -> IndexResult<Vec<u8>> {
        let payload = bincode::serialize(descriptor)?;

        let mut frame = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
        frame.push(FRAME_VERSION);
        frame.extend_from_slice(&payload);

        let crc = crc32fast::hash(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());

        Ok(frame)
    }

    fn deserialize(&self, bytes: &[u8]) -> IndexResult<D> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(IndexError::Corruption(format!(
                "Descriptor frame too short: {} bytes",
                bytes.len()
            )));
        }

        let (body, crc_bytes) = bytes.split_at(bytes.len() - 4);
        let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let computed_crc = crc32fast::hash(body);

        if stored_crc != computed_crc {
            return Err(IndexError::Corruption(format!(
                "Descriptor checksum mismatch: stored={}, computed={}",
                stored_crc, computed_crc
            )));
        }

        if body[0] != FRAME_VERSION {
            return Err(IndexError::Corruption(format!(
                "Unsupported descriptor frame version: {}",
                body[0]
            )));
        }

        bincode::deserialize(&body[1..])
            .map_err(|e| IndexError::Corruption(format!("Failed to decode descriptor: {}", e)))
    }
}

/// Human-readable JSON encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl<D> DescriptorCodec<D> for JsonCodec
where
    D: Serialize + DeserializeOwned,
{
    fn serialize(&self, descriptor: &D) -> IndexResult<Vec<u8>> {
        Ok(serde_json::to_vec(descriptor)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> IndexResult<D> {
        serde_json::from_slice(bytes)
            .map_err(|e| IndexError::Corruption(format!("Failed to decode descriptor: {}", e)))
    }
}

/// Codec selected by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Bincode,
    Json,
}

impl<D> DescriptorCodec<D> for CodecKind
where
    D: Serialize + DeserializeOwned,
{
    fn serialize(&self, descriptor: &D) -> IndexResult<Vec<u8>> {
        match self {
            CodecKind::Bincode => BincodeCodec.serialize(descriptor),
            CodecKind::Json => JsonCodec.serialize(descriptor),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> IndexResult<D> {
        match self {
            CodecKind::Bincode => BincodeCodec.deserialize(bytes),
            CodecKind::Json => JsonCodec.deserialize(bytes),
        }
    }
}

impl std::str::FromStr for CodecKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bincode" => Ok(CodecKind::Bincode),
            "json" => Ok(CodecKind::Json),
            other => Err(IndexError::Config(format!("Unknown codec: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{JournalDescriptor, ResourceKind};

    fn sample() -> JournalDescriptor {
        JournalDescriptor::new("/var/lib/journals/1700000000000.jnl", 1_700_000_000_000)
            .size(10 * 1024 * 1024)
            .commit_time(1_700_000_360_000)
            .kind(ResourceKind::Journal)
    }

    #[test]
    fn test_bincode_roundtrip() {
        let desc = sample();
        let bytes = BincodeCodec.serialize(&desc).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(bytes[0], FRAME_VERSION);

        let decoded: JournalDescriptor = BincodeCodec.deserialize(&bytes).unwrap();
        assert_eq!(decoded, desc);
    }

    #[test]
    fn test_bincode_is_deterministic() {
        let desc = sample();
        let a = DescriptorCodec::<JournalDescriptor>::serialize(&BincodeCodec, &desc).unwrap();
        let b = DescriptorCodec::<JournalDescriptor>::serialize(&BincodeCodec, &desc).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bincode_detects_bit_flip() {
        let mut bytes = BincodeCodec.serialize(&sample()).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;

        let result: IndexResult<JournalDescriptor> = BincodeCodec.deserialize(&bytes);
        assert!(matches!(result, Err(IndexError::Corruption(_))));
    }

    #[test]
    fn test_bincode_rejects_truncated_frames() {
        let bytes = BincodeCodec.serialize(&sample()).unwrap();

        for len in [0, 1, 4, bytes.len() - 1] {
            let result: IndexResult<JournalDescriptor> = BincodeCodec.deserialize(&bytes[..len]);
            assert!(
                matches!(result, Err(IndexError::Corruption(_))),
                "length {} should be corrupt",
                len
            );
        }
    }

    #[test]
    fn test_bincode_rejects_unknown_version() {
        let mut frame = vec![FRAME_VERSION + 1];
        frame.extend_from_slice(&bincode::serialize(&sample()).unwrap());
        let crc = crc32fast::hash(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());

        let result: IndexResult<JournalDescriptor> = BincodeCodec.deserialize(&frame);
        assert!(matches!(result, Err(IndexError::Corruption(_))));
    }

    #[test]
    fn test_json_roundtrip_and_corruption() {
        let desc = sample();
        let bytes = JsonCodec.serialize(&desc).unwrap();
        let decoded: JournalDescriptor = JsonCodec.deserialize(&bytes).unwrap();
        assert_eq!(decoded, desc);

        let result: IndexResult<JournalDescriptor> = JsonCodec.deserialize(b"{\"uuid\":");
        assert!(matches!(result, Err(IndexError::Corruption(_))));
    }

    #[test]
    fn test_codec_kind_dispatch() {
        let desc = sample();
        for kind in [CodecKind::Bincode, CodecKind::Json] {
            let bytes = kind.serialize(&desc).unwrap();
            let decoded: JournalDescriptor = kind.deserialize(&bytes).unwrap();
            assert_eq!(decoded, desc);
        }

        assert_eq!("JSON".parse::<CodecKind>().unwrap(), CodecKind::Json);
        assert!(matches!(
            "protobuf".parse::<CodecKind>(),
            Err(IndexError::Config(_))
        ));
    }
}
