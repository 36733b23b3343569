//! Block and block header structures.

use crate::hash::{Blake3, Hash, HashFunction};
use crate::merkle::{MerkleError, MerkleProof, MerkleTree};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the header encoding hashed by proof-of-work.
pub const POW_ENCODING_LEN: usize = 96;

/// Offset of the nonce inside the proof-of-work encoding.
pub const NONCE_OFFSET: usize = 88;

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Header format version.
    pub version: i64,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root of transactions.
    pub merkle_root: Hash,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Proof-of-work nonce. Only the miner writes this.
    pub nonce: u64,
}

impl BlockHeader {
    /// Create a header with a zero nonce, stamped with the current time.
    pub fn new(version: i64, prev_hash: Hash, merkle_root: Hash) -> Self {
        Self {
            version,
            prev_hash,
            merkle_root,
            timestamp: Self::current_timestamp(),
            nonce: 0,
        }
    }

    /// Encode the header for proof-of-work hashing.
    ///
    /// Layout, all integers big-endian:
    /// version (8) | prev_hash (32) | merkle_root (32) | timestamp (8) |
    /// difficulty_bits (8) | nonce (8)
    pub fn pow_encoding(&self, difficulty_bits: u64, nonce: u64) -> [u8; POW_ENCODING_LEN] {
        let mut buf = [0u8; POW_ENCODING_LEN];
        buf[0..8].copy_from_slice(&self.version.to_be_bytes());
        buf[8..40].copy_from_slice(self.prev_hash.as_bytes());
        buf[40..72].copy_from_slice(self.merkle_root.as_bytes());
        buf[72..80].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[80..88].copy_from_slice(&difficulty_bits.to_be_bytes());
        buf[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
        buf
    }

    /// Proof-of-work digest of this header with its stored nonce.
    pub fn pow_hash<H: HashFunction>(&self, difficulty_bits: u64) -> Hash {
        H::hash(&self.pow_encoding(difficulty_bits, self.nonce))
    }

    /// Get the current Unix timestamp.
    pub fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A block: header plus the transactions committed by its merkle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Vec<u8>>,
}

impl Block {
    /// Create an unsealed block committing to `transactions`.
    pub fn new(
        version: i64,
        prev_hash: Hash,
        transactions: Vec<Vec<u8>>,
        timestamp: i64,
    ) -> Result<Self, MerkleError> {
        let merkle_root = MerkleTree::new(&transactions)?.root();

        Ok(Self {
            header: BlockHeader {
                version,
                prev_hash,
                merkle_root,
                timestamp,
                nonce: 0,
            },
            transactions,
        })
    }

    /// Block hash: Blake3 of the header encoding at `difficulty_bits`.
    pub fn hash(&self, difficulty_bits: u64) -> Hash {
        self.header.pow_hash::<Blake3>(difficulty_bits)
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        MerkleTree::new(&self.transactions)
            .map(|tree| tree.root() == self.header.merkle_root)
            .unwrap_or(false)
    }

    /// Inclusion proof for the transaction at `index`.
    pub fn prove_transaction(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        MerkleTree::new(&self.transactions)?.proof(index)
    }
}
