//! # Block Record
//!
//! One archived chain position: its number, its own hash and the hash it
//! claims for its parent.
//!
//! ## Row Layout
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  Block                                    │
//! │  ├── number: u64       (primary key)      │
//! │  ├── hash: Vec<u8>     (raw binary)       │
//! │  └── parent_hash: Vec<u8>  (raw binary)   │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Hashes are kept as opaque byte strings. The archive does not promise a
//! fixed width and the auditor only ever compares them byte-for-byte.

use serde::{Serialize, Serializer};

/// Chain position of a block.
pub type BlockNumber = u64;

/// A stored block as seen by the auditor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Block number, unique within the archive.
    pub number: BlockNumber,
    /// Canonical hash of this block.
    #[serde(serialize_with = "serialize_prefixed_hex")]
    pub hash: Vec<u8>,
    /// Hash this block declares for its predecessor.
    #[serde(serialize_with = "serialize_prefixed_hex")]
    pub parent_hash: Vec<u8>,
}

impl Block {
    pub fn new(
        number: BlockNumber,
        hash: impl Into<Vec<u8>>,
        parent_hash: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            number,
            hash: hash.into(),
            parent_hash: parent_hash.into(),
        }
    }

    /// Returns true when `parent` is the block this one claims to extend.
    ///
    /// Only the hash link is compared. The caller is responsible for
    /// pairing blocks at consecutive numbers.
    pub fn links_to(&self, parent: &Block) -> bool {
        self.parent_hash == parent.hash
    }

    /// Block hash as `0x`-prefixed lowercase hex.
    pub fn hash_hex(&self) -> String {
        to_prefixed_hex(&self.hash)
    }

    /// Parent hash as `0x`-prefixed lowercase hex.
    pub fn parent_hash_hex(&self) -> String {
        to_prefixed_hex(&self.parent_hash)
    }
}

/// Render bytes as `0x`-prefixed lowercase hex.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde helper: hashes go out as `0x` hex strings instead of byte arrays.
pub(crate) fn serialize_prefixed_hex<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&to_prefixed_hex(bytes.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_hex_is_lowercase() {
        assert_eq!(to_prefixed_hex(&[0xAB, 0xCD, 0x01]), "0xabcd01");
    }

    #[test]
    fn empty_hash_renders_bare_prefix() {
        assert_eq!(to_prefixed_hex(&[]), "0x");
    }

    #[test]
    fn links_to_compares_parent_hash_with_parent_block_hash() {
        let parent = Block::new(9, vec![0x11; 32], vec![0x00; 32]);
        let child = Block::new(10, vec![0x22; 32], vec![0x11; 32]);
        let stranger = Block::new(10, vec![0x33; 32], vec![0x44; 32]);

        assert!(child.links_to(&parent));
        assert!(!stranger.links_to(&parent));
    }

    #[test]
    fn links_to_is_byte_exact() {
        // Same prefix, different length: not a match.
        let parent = Block::new(1, vec![0xAA, 0xBB], vec![]);
        let child = Block::new(2, vec![0x01], vec![0xAA, 0xBB, 0x00]);
        assert!(!child.links_to(&parent));
    }

    #[test]
    fn hex_accessors() {
        let block = Block::new(5, vec![0xDE, 0xAD], vec![0xBE, 0xEF]);
        assert_eq!(block.hash_hex(), "0xdead");
        assert_eq!(block.parent_hash_hex(), "0xbeef");
    }

    #[test]
    fn serializes_hashes_as_hex_strings() {
        let block = Block::new(7, vec![0x01, 0x02], vec![0x0A]);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["number"], 7);
        assert_eq!(json["hash"], "0x0102");
        assert_eq!(json["parent_hash"], "0x0a");
    }
}
