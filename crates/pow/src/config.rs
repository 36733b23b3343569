//! Mining parameters.

use crate::pow::{PowError, Result};
use crate::target::MAX_DIFFICULTY_BITS;
use serde::{Deserialize, Serialize};

/// Proof-of-work configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Required leading zero bits of a sealed header hash.
    pub difficulty_bits: u64,
    /// Nonces `0..max_nonce` are searched.
    pub max_nonce: u64,
    /// Worker threads. 1 runs the sequential miner.
    pub workers: usize,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            difficulty_bits: 8,
            max_nonce: i64::MAX as u64,
            workers: 1,
        }
    }
}

impl PowConfig {
    /// Create a new configuration with the given difficulty.
    pub fn new(difficulty_bits: u64) -> Self {
        Self {
            difficulty_bits,
            ..Self::default()
        }
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check the configuration before mining.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty_bits > MAX_DIFFICULTY_BITS {
            return Err(PowError::InvalidDifficulty(self.difficulty_bits));
        }
        if self.max_nonce == 0 {
            return Err(PowError::InvalidConfig("max_nonce must be positive".into()));
        }
        if self.workers == 0 {
            return Err(PowError::InvalidConfig("workers must be positive".into()));
        }
        Ok(())
    }
}
