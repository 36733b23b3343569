//! Difficulty targets.

use crate::pow::{PowError, Result};
use labchain_core::{Hash, H256};
use num_bigint::BigUint;

/// Largest meaningful difficulty: a target of 1 only admits the zero hash.
pub const MAX_DIFFICULTY_BITS: u64 = 256;

/// A proof-of-work target, `2^(256 - difficulty_bits)`.
///
/// A hash meets the target when, read as a 256-bit big-endian unsigned
/// integer, it is strictly less than the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    difficulty_bits: u64,
    value: BigUint,
    /// Big-endian form of `value`; `None` for `2^256`, which every hash meets.
    bytes: Option<H256>,
}

impl Target {
    /// Build the target for `difficulty_bits` leading zero bits.
    pub fn from_difficulty_bits(difficulty_bits: u64) -> Result<Self> {
        if difficulty_bits > MAX_DIFFICULTY_BITS {
            return Err(PowError::InvalidDifficulty(difficulty_bits));
        }
        let value = BigUint::from(1u8) << (MAX_DIFFICULTY_BITS - difficulty_bits);
        let bytes = if difficulty_bits == 0 {
            None
        } else {
            let be = value.to_bytes_be();
            let mut bytes = [0u8; 32];
            bytes[32 - be.len()..].copy_from_slice(&be);
            Some(bytes)
        };
        Ok(Self {
            difficulty_bits,
            value,
            bytes,
        })
    }

    pub fn difficulty_bits(&self) -> u64 {
        self.difficulty_bits
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Check if a hash is strictly below the target.
    #[inline]
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        // Lexicographic order of equal-length big-endian arrays is numeric order.
        match &self.bytes {
            Some(target) => hash.as_bytes() < target,
            None => true,
        }
    }
}
