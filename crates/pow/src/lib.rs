//! Proof-of-work consensus for labchain.
//!
//! This crate seals and validates block headers:
//! - Difficulty targets (`2^(256 - bits)`) and 256-bit target comparison
//! - Sequential mining with a deterministic, lowest-nonce result
//! - Parallel mining over a worker pool with cooperative cancellation
//! - Validation of sealed headers
//!
//! # Example
//!
//! ```rust,no_run
//! use labchain_core::{Blake3, BlockHeader, Hash, MerkleTree};
//! use labchain_pow::{seal, validate, PowConfig};
//!
//! let tree = MerkleTree::new(&[b"tx1", b"tx2", b"tx3"]).unwrap();
//! let mut header = BlockHeader::new(1, Hash::ZERO, tree.root());
//!
//! let config = PowConfig::new(16).with_workers(4);
//! let solution = seal::<Blake3>(&mut header, &config).unwrap();
//!
//! assert_eq!(header.nonce, solution.nonce);
//! assert!(validate::<Blake3>(&header, 16));
//! ```

pub mod config;
pub mod parallel;
pub mod pow;
pub mod target;

// Re-export commonly used types
pub use config::PowConfig;
pub use parallel::{CancelToken, ParallelMiner};
pub use pow::{seal, validate, PowError, ProofOfWork, Result, Solution};
pub use target::{Target, MAX_DIFFICULTY_BITS};
