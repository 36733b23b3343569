//! Proof-of-work mining and validation.
//!
//! A header is sealed by searching for a nonce whose header encoding (see
//! [`BlockHeader::pow_encoding`]) hashes below the difficulty target. The
//! difficulty bits are part of the hashed bytes, so a sealed header only
//! validates at the difficulty it was mined for.

use crate::config::PowConfig;
use crate::parallel::{CancelToken, ParallelMiner};
use crate::target::Target;
use labchain_core::block::NONCE_OFFSET;
use labchain_core::{Blake3, BlockHeader, Hash, HashFunction, MerkleError};
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during proof-of-work operations.
#[derive(Debug, Error)]
pub enum PowError {
    #[error("no nonce below {max_nonce} satisfies the target")]
    NonceExhausted { max_nonce: u64 },

    #[error("difficulty bits {0} exceed 256")]
    InvalidDifficulty(u64),

    #[error("invalid pow config: {0}")]
    InvalidConfig(String),

    #[error("mining cancelled")]
    Cancelled,

    #[error("failed to build mining thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

pub type Result<T> = std::result::Result<T, PowError>;

/// A nonce that seals a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    /// Header hash at `nonce`, below the target.
    pub hash: Hash,
    /// Hashes computed by the search that found it.
    pub attempts: u64,
}

/// Outcome of scanning one slice of the nonce space.
pub(crate) enum Scan {
    Found(Solution),
    Exhausted { attempts: u64 },
    Stopped { attempts: u64 },
}

/// Proof-of-work over a borrowed block header.
#[derive(Debug)]
pub struct ProofOfWork<'a, H = Blake3> {
    header: &'a BlockHeader,
    target: Target,
    _hasher: PhantomData<H>,
}

impl<'a> ProofOfWork<'a, Blake3> {
    /// Prepare Blake3 proof-of-work for `header` at `difficulty_bits`.
    pub fn new(header: &'a BlockHeader, difficulty_bits: u64) -> Result<Self> {
        Self::with_hasher(header, difficulty_bits)
    }
}

impl<'a, H: HashFunction> ProofOfWork<'a, H> {
    /// Prepare proof-of-work using the hash function `H`.
    pub fn with_hasher(header: &'a BlockHeader, difficulty_bits: u64) -> Result<Self> {
        Ok(Self {
            header,
            target: Target::from_difficulty_bits(difficulty_bits)?,
            _hasher: PhantomData,
        })
    }

    pub fn header(&self) -> &BlockHeader {
        self.header
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Header hash with `nonce` in place of the stored one.
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        H::hash(&self.header.pow_encoding(self.target.difficulty_bits(), nonce))
    }

    /// Search nonces `0..max_nonce` in order and return the first solution.
    pub fn run(&self, max_nonce: u64) -> Result<Solution> {
        debug!(
            difficulty_bits = self.target.difficulty_bits(),
            max_nonce, "mining header"
        );

        match self.scan(0, 1, max_nonce, || false) {
            Scan::Found(solution) => {
                info!(
                    nonce = solution.nonce,
                    hash = %solution.hash,
                    attempts = solution.attempts,
                    "header sealed"
                );
                Ok(solution)
            }
            Scan::Exhausted { attempts } | Scan::Stopped { attempts } => {
                warn!(max_nonce, attempts, "nonce space exhausted");
                Err(PowError::NonceExhausted { max_nonce })
            }
        }
    }

    /// Try nonces `start, start + step, ...` below `max_nonce`, polling `stop`
    /// before each attempt.
    pub(crate) fn scan(
        &self,
        start: u64,
        step: u64,
        max_nonce: u64,
        stop: impl Fn() -> bool,
    ) -> Scan {
        let mut data = self
            .header
            .pow_encoding(self.target.difficulty_bits(), start);
        let mut attempts = 0u64;
        let mut nonce = start;

        while nonce < max_nonce {
            if stop() {
                return Scan::Stopped { attempts };
            }

            data[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
            let hash = H::hash(&data);
            attempts += 1;

            if self.target.is_met_by(&hash) {
                return Scan::Found(Solution {
                    nonce,
                    hash,
                    attempts,
                });
            }

            nonce = match nonce.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        Scan::Exhausted { attempts }
    }

    /// Check the header's stored nonce against the target.
    pub fn validate(&self) -> bool {
        self.target.is_met_by(&self.hash_with_nonce(self.header.nonce))
    }
}

/// Validate a sealed header at `difficulty_bits`.
///
/// Returns `false` for a difficulty above 256 bits.
pub fn validate<H: HashFunction>(header: &BlockHeader, difficulty_bits: u64) -> bool {
    ProofOfWork::<H>::with_hasher(header, difficulty_bits)
        .map(|pow| pow.validate())
        .unwrap_or(false)
}

/// Mine `header` per `config` and store the winning nonce in it.
///
/// Runs the sequential miner for a single worker. With more workers a
/// [`ParallelMiner`], and so a fresh thread pool, is built for this call only;
/// callers sealing many headers should keep a miner and use
/// [`ParallelMiner::seal`]. On error the header is left untouched.
pub fn seal<H: HashFunction>(header: &mut BlockHeader, config: &PowConfig) -> Result<Solution> {
    config.validate()?;

    if config.workers == 1 {
        let solution =
            ProofOfWork::<H>::with_hasher(header, config.difficulty_bits)?.run(config.max_nonce)?;
        header.nonce = solution.nonce;
        Ok(solution)
    } else {
        ParallelMiner::<H>::with_hasher(config.clone())?.seal(header, &CancelToken::new())
    }
}
