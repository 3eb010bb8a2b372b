//! Payload fingerprints for snapshot integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XXH3-128 digest of a byte payload.
///
/// A snapshot header carries the digest of its payload. Loading recomputes it
/// and refuses the file when the two differ.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Digests `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // leading 32 bits are enough to tell two digests apart in logs
        write!(f, "ContentHash({:08x}..)", self.0 >> 96)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_payload_same_digest() {
        let grid = b"clb clb bram io_north";
        assert_eq!(ContentHash::from_bytes(grid), ContentHash::from_bytes(grid));
    }

    #[test]
    fn flipped_bit_changes_digest() {
        let mut payload = vec![0x5a; 64];
        let before = ContentHash::from_bytes(&payload);
        payload[40] ^= 0x01;
        assert_ne!(before, ContentHash::from_bytes(&payload));
    }

    #[test]
    fn display_is_full_width_hex() {
        let text = ContentHash::from_bytes(&[]).to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_shows_prefix_of_display() {
        let hash = ContentHash::from_bytes(b"tiny.snapshot");
        let full = hash.to_string();
        assert_eq!(format!("{hash:?}"), format!("ContentHash({}..)", &full[..8]));
    }

    #[test]
    fn survives_json() {
        let hash = ContentHash::from_bytes(b"header");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(serde_json::from_str::<ContentHash>(&json).unwrap(), hash);
    }
}
