//! Core primitives for labchain.
//!
//! This crate provides the hash-based integrity structures of the chain:
//! - Hash primitives behind a swappable [`HashFunction`]
//! - Merkle trees with inclusion-proof generation and verification
//! - Blocks and block headers, including the proof-of-work header encoding

pub mod block;
pub mod hash;
pub mod merkle;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockHeader};
pub use hash::{hash, hash_concat, Blake3, Hash, HashFunction, Sha256, H256};
pub use merkle::{merkle_root, tree_depth, verify_proof, MerkleError, MerkleNode, MerkleProof, MerkleTree};
