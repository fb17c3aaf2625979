//! Key encoding for commit timestamps
//!
//! Keys are the 8-byte big-endian two's-complement form of the timestamp.
//! For non-negative timestamps, byte-wise comparison of two keys agrees with
//! numeric comparison, which lets a generic byte-ordered store sort entries
//! by time.

use crate::error::{IndexError, IndexResult};

/// Size of an encoded key in bytes
pub const KEY_SIZE: usize = 8;

/// Encode a timestamp into an order-preserving key
pub fn encode(timestamp: i64) -> [u8; KEY_SIZE] {
    timestamp.to_be_bytes()
}

/// Decode a key produced by [`encode`]
pub fn decode(key: [u8; KEY_SIZE]) -> i64 {
    i64::from_be_bytes(key)
}

/// Decode a key read back from a store, checking its width
pub fn decode_slice(key: &[u8]) -> IndexResult<i64> {
    let bytes: [u8; KEY_SIZE] = key.try_into().map_err(|_| {
        IndexError::Corruption(format!(
            "Key has {} bytes, expected {}",
            key.len(),
            KEY_SIZE
        ))
    })?;
    Ok(decode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for t in [1, 255, 256, 65_536, 1_700_000_000_000, i64::MAX] {
            assert_eq!(decode(encode(t)), t);
        }
    }

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(encode(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode(0x0102), [0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_ordering_matches_numeric() {
        let mut samples: Vec<i64> = vec![1, 2, 127, 128, 255, 256, 1 << 31, 1 << 32, i64::MAX];
        samples.extend((0..64).map(|shift| 1i64 << shift).filter(|v| *v > 0));
        samples.sort_unstable();

        for pair in samples.windows(2) {
            if pair[0] < pair[1] {
                assert!(
                    encode(pair[0]) < encode(pair[1]),
                    "{} should sort before {}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_decode_slice_rejects_bad_width() {
        assert_eq!(decode_slice(&encode(42)).unwrap(), 42);
        assert!(matches!(
            decode_slice(&[0u8; 4]),
            Err(IndexError::Corruption(_))
        ));
    }
}
